/// A library section on the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub id: String,
    pub name: String,
    /// `movie`, `show` or `artist`.
    pub library_type: String,
    /// Total runtime of all items, in milliseconds.
    pub duration_total: i64,
    /// Total size on disk, in bytes.
    pub storage_total: i64,
}

pub fn is_library_directory_type(directory_type: &str) -> bool {
    matches!(directory_type, "movie" | "show" | "artist")
}

/// Identity of the server, used to label every exported series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// Read access to the server's library sections.
///
/// Implementations must not block on I/O: lookups are served from data
/// already fetched by a background refresh.
pub trait LibraryCatalog: Send + Sync {
    fn identity(&self) -> ServerIdentity;

    fn libraries(&self) -> Vec<Library>;

    fn lookup_library(&self, section_id: &str) -> Option<Library> {
        self.libraries().into_iter().find(|l| l.id == section_id)
    }
}
