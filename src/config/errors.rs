//! Error code constants

/// Preference store error codes (0100-0199)
pub const ERR_STORE_IO: &str = "E-OVD-0100";
pub const ERR_STORE_DB: &str = "E-OVD-0101";
pub const ERR_STORE_SERDE: &str = "E-OVD-0102";
pub const ERR_STORE_NAMESPACE: &str = "E-OVD-0103";

/// Registry and visibility error codes (0200-0299)
pub const ERR_REGISTRY_DUPLICATE: &str = "E-OVD-0200";
pub const ERR_UNKNOWN_MODULE: &str = "E-OVD-0201";
pub const ERR_MANDATORY_MODULE: &str = "E-OVD-0202";
pub const ERR_PRESET_NOT_FOUND: &str = "E-OVD-0203";
pub const ERR_PRESET_IMMUTABLE: &str = "E-OVD-0204";
pub const ERR_REGISTRY_EMPTY_ID: &str = "E-OVD-0205";

/// Window control error codes (0300-0399)
pub const ERR_WINDOW: &str = "E-OVD-0300";

/// Module error codes (0400-0499)
pub const ERR_MODULE_PERMISSION: &str = "E-OVD-0401";
pub const ERR_MODULE_NETWORK: &str = "E-OVD-0402";
pub const ERR_MODULE_PARSE: &str = "E-OVD-0403";
pub const ERR_MODULE_UNSUPPORTED: &str = "E-OVD-0404";
pub const ERR_MODULE_STORE: &str = "E-OVD-0405";
pub const ERR_MODULE_PANIC: &str = "E-OVD-0406";
pub const ERR_MODULE_ACTION: &str = "E-OVD-0407";

/// Host error codes (0500-0599)
pub const ERR_NO_ACTIVE_MODULE: &str = "E-OVD-0500";

/// Update check error codes (0600-0699)
pub const ERR_UPDATE_NETWORK: &str = "E-OVD-0600";
pub const ERR_UPDATE_MANIFEST: &str = "E-OVD-0601";
pub const ERR_UPDATE_VERSION: &str = "E-OVD-0602";

/// CLI error codes (0700-0799)
pub const ERR_CLI_MISSING_COMMAND: &str = "E-OVD-0700";
pub const ERR_CLI_UNKNOWN_COMMAND: &str = "E-OVD-0701";
pub const ERR_CLI_MISSING_ARG: &str = "E-OVD-0702";
