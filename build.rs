use std::{fs, path::Path, process::Command, time::SystemTime};

fn main() {
    let now = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    println!("cargo:rustc-env=BUILD_TIME={}", now);

    println!("cargo:rerun-if-changed=.git/HEAD");
    if Path::new(".git/refs/heads").exists() {
        println!("cargo:rerun-if-changed=.git/refs/heads");
    }

    let (branch, commit) = git_info();
    println!("cargo:rustc-env=GIT_BRANCH={}", branch);
    println!("cargo:rustc-env=GIT_COMMIT={}", commit);
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Falls back to reading `.git/HEAD` when the git binary is unavailable.
fn git_info() -> (String, String) {
    let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"]);
    let commit = git(&["rev-parse", "--short", "HEAD"]);
    if let (Some(branch), Some(commit)) = (&branch, &commit) {
        return (branch.clone(), commit.clone());
    }

    let Ok(head) = fs::read_to_string(".git/HEAD") else {
        return ("unknown".into(), "unknown".into());
    };
    match head.trim().strip_prefix("ref: ") {
        Some(ref_path) => {
            let branch = ref_path.rsplit('/').next().unwrap_or("unknown").to_string();
            let commit = fs::read_to_string(format!(".git/{}", ref_path))
                .map(|c| c.trim().chars().take(7).collect())
                .unwrap_or_else(|_| "unknown".into());
            (branch, commit)
        }
        None => ("detached".into(), head.trim().chars().take(7).collect()),
    }
}
