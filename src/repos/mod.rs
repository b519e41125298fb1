/*
 * Responsibility
 * - 永続化層 (CredentialStore の境界と実装)
 */
pub mod credential_store;
pub mod error;
pub mod memory_store;
pub mod user_repo;
