// src/consts.rs
//! Shared constants: default schema names, environment variables, provider parameters

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "token-encryptor.toml";

/// Environment variable pointing at the config file
pub const ENV_CONFIG: &str = "TOKEN_ENCRYPTOR_CONFIG";

/// Environment variable overriding `[database] path`
pub const ENV_DATABASE: &str = "TOKEN_ENCRYPTOR_DB";

/// Environment variable holding the provider passphrase (never read from the config file)
pub const ENV_PASSPHRASE: &str = "TOKEN_ENCRYPTOR_PASSPHRASE";

/// Default identity database location
pub const DEFAULT_DATABASE_PATH: &str = "WSO2IDENTITY_DB.sqlite";

/// How long a statement waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// KDF iterations for the AES Crypt v3 provider
// ~0.5s per value on typical hardware; tables with many tokens want less
pub const DEFAULT_KDF_ITERATIONS: u32 = 300_000;

/// Header magic for AES Crypt v3 output
pub const AESCRYPT_V3_HEADER: &[u8; 5] = b"AES\x03\x00";

// OAuth consumer application registry
pub const APPS_TABLE: &str = "IDN_OAUTH_CONSUMER_APPS";
pub const APPS_ID_COLUMN: &str = "CONSUMER_KEY";
pub const APPS_SECRET_COLUMNS: &[&str] = &["CONSUMER_SECRET"];

// OAuth2 access-token store
pub const TOKENS_TABLE: &str = "IDN_OAUTH2_ACCESS_TOKEN";
pub const TOKENS_ID_COLUMN: &str = "TOKEN_ID";
pub const TOKENS_SECRET_COLUMNS: &[&str] = &["ACCESS_TOKEN", "REFRESH_TOKEN"];

// OAuth2 authorization-code store
pub const CODES_TABLE: &str = "IDN_OAUTH2_AUTHORIZATION_CODE";
pub const CODES_ID_COLUMN: &str = "CODE_ID";
pub const CODES_SECRET_COLUMNS: &[&str] = &["AUTHORIZATION_CODE"];
