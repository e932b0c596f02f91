use serde::Deserialize;

/// Where caller permission grants come from.
///
/// Authentication itself happens upstream. Grants are taken from a
/// `CallerPermissions` request extension when an in-process layer sets
/// one, otherwise from `header` when configured. `anonymous` tokens are
/// granted to every caller on top of either source.
///
/// # Example
///
/// ```toml
/// [permissions]
/// header = "x-permissions"
/// anonymous = ["READ"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsConfig {
    /// Request header carrying a comma-separated list of granted tokens.
    ///
    /// Only enable this behind a proxy that strips the header from
    /// untrusted clients.
    #[serde(default)]
    pub header: Option<String>,
    /// Tokens granted to every caller.
    #[serde(default)]
    pub anonymous: Vec<String>,
}
