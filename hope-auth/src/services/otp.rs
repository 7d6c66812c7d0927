use async_trait::async_trait;

use hope_shared::clients::twilio::TwilioClient;

use crate::services::phone::PhoneNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatch {
    /// Provider status for the new verification, normally `pending`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCheck {
    pub approved: bool,
    pub status: String,
}

/// Sends and checks one-time codes. An `Err` is a provider or transport
/// failure; a wrong code is `Ok` with `approved == false`.
#[async_trait]
pub trait OtpGateway: Send + Sync {
    async fn request_code(&self, phone: &PhoneNumber) -> anyhow::Result<OtpDispatch>;

    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> anyhow::Result<OtpCheck>;
}

#[async_trait]
pub trait SmsNotifier: Send + Sync {
    async fn send_sms(&self, phone: &PhoneNumber, body: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl OtpGateway for TwilioClient {
    async fn request_code(&self, phone: &PhoneNumber) -> anyhow::Result<OtpDispatch> {
        let verification = self.start_verification(&phone.e164()).await?;
        Ok(OtpDispatch {
            status: verification.status,
        })
    }

    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> anyhow::Result<OtpCheck> {
        let check = self.check_verification(&phone.e164(), code).await?;
        Ok(OtpCheck {
            approved: check.is_approved(),
            status: check.status,
        })
    }
}

#[async_trait]
impl SmsNotifier for TwilioClient {
    async fn send_sms(&self, phone: &PhoneNumber, body: &str) -> anyhow::Result<()> {
        self.send_message(&phone.e164(), body).await?;
        Ok(())
    }
}
