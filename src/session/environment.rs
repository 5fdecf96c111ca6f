//! Socket names, arguments and environment handed to the session's children.
//!
//! Nothing here touches the session process's own environment. Host
//! variables are read through a lookup function so the rules can be
//! evaluated against any environment.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Prefix of the helper display server's socket.
pub const MASTER_SOCKET_PREFIX: &str = "hawaii-master-";
/// Prefix of the socket a nested compositor serves itself.
pub const SLAVE_SOCKET_PREFIX: &str = "hawaii-slave-";

const SOCKET_SUFFIX_LEN: usize = 12;

/// Socket names for one nested session, sharing a random suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketNames {
    pub master: String,
    pub slave: String,
}

impl SocketNames {
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SOCKET_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self::with_suffix(&suffix)
    }

    pub fn with_suffix(suffix: &str) -> Self {
        Self {
            master: format!("{}{}", MASTER_SOCKET_PREFIX, suffix),
            slave: format!("{}{}", SLAVE_SOCKET_PREFIX, suffix),
        }
    }
}

/// Arguments appended to the helper command.
pub fn helper_args(sockets: &SocketNames) -> Vec<String> {
    vec![format!("--socket={}", sockets.master)]
}

/// Arguments appended to the compositor command.
pub fn compositor_args(sockets: Option<&SocketNames>) -> Vec<String> {
    match sockets {
        Some(sockets) => vec![
            "-platform".to_string(),
            "wayland".to_string(),
            format!("--socket={}", sockets.slave),
        ],
        None => Vec::new(),
    }
}

/// Variables set on the compositor, on top of the session environment.
///
/// `helper_socket` is the helper's socket name when running nested.
pub fn compositor_environment<F>(helper_socket: Option<&str>, lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = Vec::new();
    if let Some(socket) = helper_socket {
        env.push(("WAYLAND_DISPLAY".to_string(), socket.to_string()));
    }
    env.push(("KSCREEN_BACKEND".to_string(), "QScreen".to_string()));
    env.push(("QT_QUICK_CONTROLS_STYLE".to_string(), "Wind".to_string()));
    if helper_socket.is_none() && lookup("DISPLAY").is_some() {
        env.push(("QT_XCB_GL_INTEGRATION".to_string(), "xcb_egl".to_string()));
    }
    env
}

/// Variables every session child receives.
pub fn session_environment<F>(lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = Vec::new();

    if let Some(home) = lookup("HOME") {
        if lookup("XDG_DATA_HOME").is_none() {
            env.push(("XDG_DATA_HOME".to_string(), format!("{}/.local/share", home)));
        }
        if lookup("XDG_CONFIG_HOME").is_none() {
            env.push(("XDG_CONFIG_HOME".to_string(), format!("{}/.config", home)));
        }
    }

    let fixed = [
        ("XDG_CURRENT_DESKTOP", "Hawaii"),
        ("XDG_MENU_PREFIX", "hawaii-"),
        ("QT_QPA_PLATFORMTHEME", "Hawaii"),
        ("QT_PLATFORM_PLUGIN", "Hawaii"),
        ("QT_QUICK_CONTROLS_STYLE", "Aluminium"),
        ("SAL_USE_VCLPLUGIN", "kde"),
        ("XCURSOR_THEME", "hawaii"),
        ("XCURSOR_SIZE", "16"),
    ];
    env.extend(fixed.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    env
}

/// Lookup against the session process's real environment.
pub fn host_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn get<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
        env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_socket_names_share_suffix() {
        let names = SocketNames::generate();
        let master = names.master.strip_prefix(MASTER_SOCKET_PREFIX).unwrap();
        let slave = names.slave.strip_prefix(SLAVE_SOCKET_PREFIX).unwrap();
        assert_eq!(master, slave);
        assert_eq!(master.len(), 12);
        assert!(master.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(SocketNames::generate(), names);
    }

    #[test]
    fn test_nested_arguments() {
        let names = SocketNames::with_suffix("abc");
        assert_eq!(helper_args(&names), vec!["--socket=hawaii-master-abc"]);
        assert_eq!(
            compositor_args(Some(&names)),
            vec!["-platform", "wayland", "--socket=hawaii-slave-abc"]
        );
        assert!(compositor_args(None).is_empty());
    }

    #[test]
    fn test_compositor_environment() {
        let host = lookup_in(&[("DISPLAY", ":0")]);

        let nested = compositor_environment(Some("hawaii-master-abc"), &host);
        assert_eq!(get(&nested, "WAYLAND_DISPLAY"), Some("hawaii-master-abc"));
        assert_eq!(get(&nested, "KSCREEN_BACKEND"), Some("QScreen"));
        assert_eq!(get(&nested, "QT_XCB_GL_INTEGRATION"), None);

        let direct = compositor_environment(None, &host);
        assert_eq!(get(&direct, "WAYLAND_DISPLAY"), None);
        assert_eq!(get(&direct, "QT_XCB_GL_INTEGRATION"), Some("xcb_egl"));

        let headless = compositor_environment(None, lookup_in(&[]));
        assert_eq!(get(&headless, "QT_XCB_GL_INTEGRATION"), None);
    }

    #[test]
    fn test_session_environment_defaults() {
        let env = session_environment(lookup_in(&[
            ("HOME", "/home/hawaii"),
            ("XDG_CONFIG_HOME", "/etc/xdg-user"),
        ]));
        assert_eq!(get(&env, "XDG_DATA_HOME"), Some("/home/hawaii/.local/share"));
        assert_eq!(get(&env, "XDG_CONFIG_HOME"), None);
        assert_eq!(get(&env, "XDG_CURRENT_DESKTOP"), Some("Hawaii"));
        assert_eq!(get(&env, "XCURSOR_SIZE"), Some("16"));
    }
}
