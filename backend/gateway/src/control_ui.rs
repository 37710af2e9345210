//! Static hosting for the browser client.
//!
//! `/` serves `index.html`; any other unmatched path is looked up in the
//! static directory.

use std::path::Path;

use tower_http::services::ServeDir;

pub fn static_files(static_dir: &Path) -> ServeDir {
    ServeDir::new(static_dir).append_index_html_on_directories(true)
}
