//! reqwest implementation of the pack API.
//!
//! | Operation | Request |
//! |---|---|
//! | fetch pack | `GET {base}/packs/{id}` |
//! | fetch library | `GET {base}/library/samples` |
//! | unbind | `DELETE {base}/packs/{pack}/samples/{sample}` |
//! | update | `PUT {base}/packs/{id}` (multipart) |
//! | create | `POST {base}/packs` (multipart) |

mod client;
mod config;
mod error;
mod multipart;

pub use client::PackClient;
pub use config::HttpConfig;
