//! Remote payment service operations
//!
//! Each variant maps to one endpoint of the payment service. The route table
//! lives here so the client, the event log and the error messages agree on
//! names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An operation offered by the payment service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Authenticate,
    HasPin,
    GetPin,
    SetPin,
    MakePayment,
    BlockAccount,
    ListTransactions,
    RequestOtp,
    VerifyOtp,
    ValidateVendor,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::Authenticate,
        Operation::HasPin,
        Operation::GetPin,
        Operation::SetPin,
        Operation::MakePayment,
        Operation::BlockAccount,
        Operation::ListTransactions,
        Operation::RequestOtp,
        Operation::VerifyOtp,
        Operation::ValidateVendor,
    ];

    /// Stable snake_case name, used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Authenticate => "authenticate",
            Operation::HasPin => "has_pin",
            Operation::GetPin => "get_pin",
            Operation::SetPin => "set_pin",
            Operation::MakePayment => "make_payment",
            Operation::BlockAccount => "block_account",
            Operation::ListTransactions => "list_transactions",
            Operation::RequestOtp => "request_otp",
            Operation::VerifyOtp => "verify_otp",
            Operation::ValidateVendor => "validate_vendor",
        }
    }

    /// HTTP method of the endpoint
    pub fn method(&self) -> &'static str {
        match self {
            Operation::HasPin
            | Operation::GetPin
            | Operation::ListTransactions
            | Operation::ValidateVendor => "GET",
            _ => "POST",
        }
    }

    /// Endpoint path relative to the service base URL (without query string)
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Authenticate => "/login/student",
            Operation::HasPin => "/student/has-pin",
            Operation::GetPin => "/student/get-pin",
            Operation::SetPin => "/student/set-pin",
            Operation::MakePayment => "/transaction",
            Operation::BlockAccount => "/student/block-account",
            Operation::ListTransactions => "/student/transactions",
            Operation::RequestOtp => "/student/reset-pin/request-otp",
            Operation::VerifyOtp => "/student/reset-pin/verify-otp",
            Operation::ValidateVendor => "/vendor",
        }
    }

    /// Whether the request carries the session bearer token
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Operation::Authenticate)
    }

    /// Whether a 401 triggers re-authentication and a bounded retry.
    ///
    /// Authenticate never retries: a 401 there is reported as an unexpected
    /// status and the stored session is left alone.
    pub fn retries_on_unauthorized(&self) -> bool {
        matches!(
            self,
            Operation::HasPin | Operation::GetPin | Operation::SetPin | Operation::ListTransactions
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
