use crate::{
    modules::{
        context::Initialize,
        error::{code::ErrorCode, OrderResult},
    },
    raise_error,
};

pub struct MailOrderTls;

impl Initialize for MailOrderTls {
    async fn initialize() -> OrderResult<()> {
        rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
            .map_err(|_| {
                raise_error!(
                    "failed to set crypto provider".into(),
                    ErrorCode::InternalError
                )
            })
    }
}
