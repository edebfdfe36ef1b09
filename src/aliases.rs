// src/aliases.rs
//! secure-gate secret types used for credential material held in memory
//!
//! Both zeroize on drop and keep their contents out of `Debug` output.

use secure_gate::dynamic_alias;

// Plaintext value of a sensitive column between read and encryption
dynamic_alias!(SecretValue, String);

// Passphrase handed to the AES Crypt provider
dynamic_alias!(ProviderPassphrase, String);
