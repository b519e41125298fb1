/*
 * Responsibility
 * - ドメインロジック (認証・認可) の公開口
 */
pub mod auth;
