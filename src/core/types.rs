//! Type aliases for domain concepts.

/// A secret key name (e.g., DATABASE_URL). Matches `[A-Za-z_][A-Za-z0-9_]*`.
pub type SecretName = String;

/// An environment name (e.g., "default", "production").
pub type EnvName = String;

/// A base64-encoded age ciphertext, unwrapped (no line breaks).
pub type Ciphertext = String;

/// An age public key string (bech32, starts with `age1`).
pub type PublicKey = String;

/// A team member name.
pub type MemberName = String;
