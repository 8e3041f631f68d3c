//! Path/identifier reconciliation
//!
//! The running instance executes against a patched copy of the project
//! whose filesystem root differs from the local project root, and it
//! always reports resource identifiers with forward-slash separators
//! regardless of the controlling machine's OS. The mapper translates in
//! both directions so breakpoints set on local paths match what the
//! instance reports, and vice versa.

use std::path::{Path, PathBuf};

use super::core::CoreSession;
use super::state::SharedState;

/// Convert a local path to file-URI form
///
/// Backslashes become forward slashes; a drive-letter path gains the
/// extra leading slash (`C:\p` -> `file:///C:/p`).
pub fn path_to_file_uri(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{}", s)
    } else {
        format!("file:///{}", s)
    }
}

/// Extract the forward-slash path from a file URI
///
/// Returns `None` for non-file identifiers (other schemes are resolved by
/// the core session, not here).
pub fn file_uri_to_slash_path(uri: &str) -> Option<String> {
    uri.strip_prefix("file://").map(|rest| rest.replace('\\', "/"))
}

/// Normalize a device root to a forward-slash plain path with a trailing
/// slash, accepting either URI or plain-path form
fn device_root_slash_path(root: &str) -> String {
    let path = file_uri_to_slash_path(root).unwrap_or_else(|| root.replace('\\', "/"));
    with_trailing_slash(&path)
}

/// Normalize a device root to URI form, accepting either URI or
/// plain-path form
fn device_root_uri(root: &str) -> String {
    if root.contains("://") {
        root.replace('\\', "/")
    } else {
        path_to_file_uri(Path::new(root))
    }
}

fn with_trailing_slash(s: &str) -> String {
    if s.ends_with('/') {
        s.to_string()
    } else {
        format!("{}/", s)
    }
}

/// Bidirectional source mapper between local paths and instance identifiers
#[derive(Debug, Clone)]
pub struct SourceMapper {
    state: SharedState,
    project_root: PathBuf,
}

impl SourceMapper {
    pub fn new(state: SharedState, project_root: PathBuf) -> Self {
        Self {
            state,
            project_root,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Every identifier the running instance might use for a local path
    ///
    /// Base candidates from the core session come first (consumers probe
    /// in order and take the first match); device-remapped candidates are
    /// appended after, preserving base order among themselves. Without a
    /// known device root only the base set is returned.
    pub fn expand(&self, core: &dyn CoreSession, local: &Path) -> Vec<String> {
        let mut candidates = core.expand_source_path(local);

        let Some(device_root) = self.state.device_root() else {
            return candidates;
        };

        let device_root = with_trailing_slash(&device_root_uri(&device_root));
        let root_uri = with_trailing_slash(&path_to_file_uri(&self.project_root));

        let remapped: Vec<String> = candidates
            .iter()
            .filter_map(|candidate| {
                candidate
                    .strip_prefix(root_uri.as_str())
                    .map(|rest| format!("{}{}", device_root, rest))
            })
            .collect();

        candidates.extend(remapped);
        candidates
    }

    /// Local path for an identifier reported by the running instance
    ///
    /// The instance always reports forward-slash paths, so the device-root
    /// rewrite works on the forward-slash form explicitly rather than the
    /// native convention; the remainder is re-joined onto the project root
    /// with native path joining. The core session's default resolution is
    /// the fallback when the rewrite does not apply.
    pub fn resolve(&self, core: &dyn CoreSession, uri: &str) -> Option<PathBuf> {
        if let Some(device_root) = self.state.device_root() {
            if let Some(slash_path) = file_uri_to_slash_path(uri) {
                let device_root_path = device_root_slash_path(&device_root);
                if let Some(rest) = slash_path.strip_prefix(device_root_path.as_str()) {
                    let mut local = self.project_root.clone();
                    for part in rest.split('/').filter(|p| !p.is_empty()) {
                        local.push(part);
                    }
                    return Some(local);
                }
            }
        }

        core.resolve_remote_uri(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::core::LocalCore;

    fn mapper_with_state() -> (SourceMapper, SharedState) {
        let state = SharedState::new();
        let mapper = SourceMapper::new(state.clone(), PathBuf::from("/home/user/proj"));
        (mapper, state)
    }

    #[test]
    fn test_expand_without_device_root_is_base_only() {
        let (mapper, _state) = mapper_with_state();
        let core = LocalCore::new();

        let candidates = mapper.expand(&core, Path::new("/home/user/proj/lib/main.x"));
        assert_eq!(candidates, vec!["file:///home/user/proj/lib/main.x"]);
    }

    #[test]
    fn test_expand_appends_device_remap_after_base() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port(
            "ws://host:1/ws".to_string(),
            Some("file:///data/app/".to_string()),
        );

        let candidates = mapper.expand(&core, Path::new("/home/user/proj/lib/main.x"));
        assert_eq!(
            candidates,
            vec![
                "file:///home/user/proj/lib/main.x",
                "file:///data/app/lib/main.x",
            ]
        );
    }

    #[test]
    fn test_expand_outside_project_root_gets_no_remap() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port(
            "ws://host:1/ws".to_string(),
            Some("file:///data/app/".to_string()),
        );

        let candidates = mapper.expand(&core, Path::new("/usr/lib/sdk/core.x"));
        assert_eq!(candidates, vec!["file:///usr/lib/sdk/core.x"]);
    }

    #[test]
    fn test_expand_handles_device_root_without_trailing_slash() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port("ws://host:1/ws".to_string(), Some("file:///data/app".to_string()));

        let candidates = mapper.expand(&core, Path::new("/home/user/proj/lib/main.x"));
        assert_eq!(candidates[1], "file:///data/app/lib/main.x");
    }

    #[test]
    fn test_resolve_rewrites_device_rooted_identifier() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port(
            "ws://host:1/ws".to_string(),
            Some("file:///data/app/".to_string()),
        );

        let local = mapper
            .resolve(&core, "file:///data/app/lib/main.x")
            .unwrap();
        assert_eq!(local, Path::new("/home/user/proj").join("lib").join("main.x"));
    }

    #[test]
    fn test_resolve_falls_back_without_device_root() {
        let (mapper, _state) = mapper_with_state();
        let core = LocalCore::new();

        let local = mapper
            .resolve(&core, "file:///home/user/proj/lib/main.x")
            .unwrap();
        assert_eq!(local, PathBuf::from("/home/user/proj/lib/main.x"));
    }

    #[test]
    fn test_resolve_non_file_identifier_defers_to_core() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port(
            "ws://host:1/ws".to_string(),
            Some("file:///data/app/".to_string()),
        );

        assert!(mapper.resolve(&core, "package:thing/main.x").is_none());
    }

    #[test]
    fn test_round_trip_through_device_remap() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port(
            "ws://host:1/ws".to_string(),
            Some("file:///data/app/".to_string()),
        );

        let original = Path::new("/home/user/proj/lib/src/widget.x");
        let candidates = mapper.expand(&core, original);
        let remapped = candidates.last().unwrap();
        assert!(remapped.starts_with("file:///data/app/"));

        let resolved = mapper.resolve(&core, remapped).unwrap();
        assert_eq!(resolved, original);
    }

    #[test]
    fn test_path_to_file_uri_drive_letter() {
        assert_eq!(
            path_to_file_uri(Path::new("C:\\proj\\lib\\main.x")),
            "file:///C:/proj/lib/main.x"
        );
    }

    #[test]
    fn test_expand_plain_path_device_root_yields_uri_candidates() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port("ws://host:1/ws".to_string(), Some("/data/app".to_string()));

        let candidates = mapper.expand(&core, Path::new("/home/user/proj/lib/main.x"));
        assert_eq!(candidates[1], "file:///data/app/lib/main.x");

        // And back: the remapped identifier resolves to the original path
        let resolved = mapper.resolve(&core, &candidates[1]).unwrap();
        assert_eq!(
            resolved,
            Path::new("/home/user/proj").join("lib").join("main.x")
        );
    }

    #[test]
    fn test_device_root_accepts_plain_path_form() {
        let (mapper, state) = mapper_with_state();
        let core = LocalCore::new();
        state.set_debug_port("ws://host:1/ws".to_string(), Some("/data/app/".to_string()));

        let local = mapper
            .resolve(&core, "file:///data/app/lib/main.x")
            .unwrap();
        assert_eq!(local, Path::new("/home/user/proj").join("lib").join("main.x"));
    }
}
