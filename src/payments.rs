//! Payment confirmation checks
//!
//! The payment gateway collects the money, the client hands its confirmation to the subscribe
//! endpoint. With a gateway secret configured, the confirmation must be signed by the gateway
//! before a subscription is created. Without one, every request is treated as paid.

use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::courses::Course;
use crate::users::User;

type HmacSha256 = Hmac<Sha256>;

/// Payment failures, no subscription is created for any of these
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Nothing to verify
    #[error("Payment confirmation required")]
    MissingConfirmation,

    /// The signature does not match the confirmation
    #[error("Payment could not be verified")]
    InvalidSignature,

    /// Paid less than the course costs
    #[error("Payment of {paid} does not cover the price of {price}")]
    InsufficientAmount {
        /// What was paid
        paid: i64,

        /// What the course costs
        price: i64,
    },
}

/// Confirmation of a payment, as reported by the payment gateway
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Reference of the payment at the gateway
    pub reference: String,

    /// Amount paid in whole units
    pub amount: i64,

    /// Hex encoded HMAC-SHA256 of the payment, signed by the gateway
    pub signature: String,
}

/// Verifies payment confirmations before subscribing
#[derive(Clone)]
pub enum PaymentVerifier {
    /// Trust the client, every subscribe request counts as paid
    Mock,

    /// Confirmations must be signed with the shared gateway secret
    Signed {
        /// Shared secret with the payment gateway
        secret: Vec<u8>,
    },
}

impl PaymentVerifier {
    /// Verifier for confirmations signed with the given secret
    pub fn signed(secret: &[u8]) -> Self {
        Self::Signed {
            secret: secret.to_vec(),
        }
    }

    /// Check the payment of a user for a course
    ///
    /// Returns the payment reference to keep with the subscription
    pub fn verify(
        &self,
        confirmation: Option<&PaymentConfirmation>,
        user: &User,
        course: &Course,
    ) -> Result<Option<String>, PaymentError> {
        match self {
            Self::Mock => Ok(confirmation.map(|confirmation| confirmation.reference.clone())),
            Self::Signed { secret } => {
                let confirmation = confirmation.ok_or(PaymentError::MissingConfirmation)?;

                let signature = hex::decode(&confirmation.signature)
                    .map_err(|_| PaymentError::InvalidSignature)?;

                mac(
                    secret,
                    &confirmation.reference,
                    &user.id,
                    &course.id,
                    confirmation.amount,
                )?
                .verify_slice(&signature)
                .map_err(|_| PaymentError::InvalidSignature)?;

                if confirmation.amount < course.price {
                    return Err(PaymentError::InsufficientAmount {
                        paid: confirmation.amount,
                        price: course.price,
                    });
                }

                Ok(Some(confirmation.reference.clone()))
            }
        }
    }
}

/// Sign a payment the way the gateway does
#[cfg(test)]
pub fn sign(
    secret: &[u8],
    reference: &str,
    user_id: &Uuid,
    course_id: &Uuid,
    amount: i64,
) -> Result<String, PaymentError> {
    let mac = mac(secret, reference, user_id, course_id, amount)?;

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// The MAC over everything a confirmation covers
fn mac(
    secret: &[u8],
    reference: &str,
    user_id: &Uuid,
    course_id: &Uuid,
    amount: i64,
) -> Result<HmacSha256, PaymentError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| PaymentError::InvalidSignature)?;

    mac.update(format!("{reference}:{user_id}:{course_id}:{amount}").as_bytes());

    Ok(mac)
}
