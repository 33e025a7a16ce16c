// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::OrderResult;

/// Process-wide setup run once before the first order.
pub trait Initialize {
    async fn initialize() -> OrderResult<()>;
}
