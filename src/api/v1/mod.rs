/*
 * Responsibility
 * - v1 の公開ポイント (routes() の re-export など)
 * - URL は version prefix なしで公開する (/auth/login など既存クライアントとの互換)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
