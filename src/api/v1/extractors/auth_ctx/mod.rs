/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - リクエスト単位の認証コンテキスト（AuthCtx）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - AuthCtx, Denied
 * - AuthCtxExtractor, CurrentPrincipal
 * - bearer_token
 */

mod core;
mod types;

pub use self::core::{AuthCtxExtractor, CurrentPrincipal, bearer_token};
pub use self::types::{AuthCtx, Denied};
