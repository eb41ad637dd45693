//! Test fixtures and constants.

/// A well-formed age public key with no matching identity in any test.
pub const ORPHAN_PUBLIC_KEY: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// An invalid public key for negative tests.
pub const INVALID_PUBLIC_KEY: &str = "not-a-valid-age-key";

/// Standard test secrets.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("API_KEY", "sk-test-12345"),
    ("JWT_SECRET", "super-secret-jwt-token"),
];

/// Sample .env content for import tests.
pub const SAMPLE_ENV: &str = "\
# database\n\
DB_HOST=localhost\n\
DB_PASS=\"p@ss w0rd\"\n\
\n\
export QUEUE_URL=redis://localhost:6379\n";
