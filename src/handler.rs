//! The sink that receives delivered rows.

use std::path::Path;

/// Receives every delivered row together with the file it came from.
///
/// Calls for one watcher happen sequentially on that watcher's task, and a
/// slow handler delays that watcher's next poll. A handler shared between
/// watchers (for example behind `Arc<Mutex<_>>`) is called from several tasks.
pub trait RowHandler {
    fn handle_row(&mut self, path: &Path, fields: &[String]);
}

impl<F> RowHandler for F
where
    F: FnMut(&Path, &[String]),
{
    fn handle_row(&mut self, path: &Path, fields: &[String]) {
        self(path, fields)
    }
}
