/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証 filter + 認可 guard, http: 横断的な transport 設定
 */
pub mod auth;
pub mod http;
