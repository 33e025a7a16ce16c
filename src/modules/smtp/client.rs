use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::raise_error;
use mail_send::smtp::message::IntoMessage;
use mail_send::SmtpClient;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

pub struct OrderSmtpClient(pub(crate) SmtpClient<TlsStream<TcpStream>>);

pub(crate) trait Sender {
    async fn send_email<'x>(&mut self, message: impl IntoMessage<'x>) -> OrderResult<()>;
    async fn quit(self) -> OrderResult<()>;
}

impl Sender for OrderSmtpClient {
    async fn send_email<'x>(&mut self, message: impl IntoMessage<'x>) -> OrderResult<()> {
        self.0
            .send(message)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed))
    }

    async fn quit(self) -> OrderResult<()> {
        self.0
            .quit()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed))
    }
}
