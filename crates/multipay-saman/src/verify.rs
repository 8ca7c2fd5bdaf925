//! Shared verification path. Both Saman flavors confirm transactions
//! through the same reference-payment SOAP service, with the reference
//! number arriving in the gateway's callback.

use multipay_core::{CallbackParams, PaymentError, PaymentResult, Receipt, StatusMap};
use multipay_soap::{escape, SoapClient};
use tracing::error;

pub(crate) const UNKNOWN_ERROR: &str = "Unknown error reported by the gateway.";

/// Verification status vocabulary, shared by both Saman flavors.
pub(crate) const VERIFY_STATUS: StatusMap = StatusMap::new(
    &[
        (-1, "Processing error; the reference number and merchant of sale and verification may not match."),
        (-3, "Reference number is not in the valid format."),
        (-4, "Merchant authentication failed."),
        (-6, "Transaction is older than thirty minutes and can no longer be verified."),
        (-7, "Reference number is empty."),
        (-8, "Reference number is longer than allowed."),
        (-9, "Reference number contains invalid characters."),
        (-10, "Reference number is not valid Base64; it may belong to a different protocol."),
        (-11, "Reference number is shorter than allowed."),
        (-12, "Amount is negative."),
        (-13, "Amount of the reversal request exceeds the amount of the original transaction."),
        (-14, "The transaction does not exist."),
        (-15, "Amount is not numeric."),
        (-16, "Internal bank error."),
        (-17, "The transaction did not originate from this terminal."),
        (-18, "Merchant IP address is invalid, or reversal is not enabled for this terminal."),
    ],
    UNKNOWN_ERROR,
);

/// Run `VerifyTransaction` and interpret the numeric result: negative
/// values are rejections, non-negative values are the settled amount.
pub(crate) async fn verify_transaction(
    soap: &SoapClient,
    url: &str,
    ref_num: &str,
    merchant_id: &str,
) -> PaymentResult<f64> {
    let body = format!(
        "<VerifyTransaction><RefNum>{}</RefNum><MerchantID>{}</MerchantID></VerifyTransaction>",
        escape(ref_num),
        escape(merchant_id),
    );

    let response = soap.call(url, "VerifyTransaction", &body).await?;
    let result = response.require("VerifyTransactionResult")?;

    let status: f64 = result.parse().map_err(|_| {
        PaymentError::UnexpectedResponse(format!("non-numeric verification result: {result}"))
    })?;

    if status < 0.0 {
        let code = status as i64;
        error!("Saman verification rejected: status={}", code);
        return Err(PaymentError::InvalidPayment {
            message: VERIFY_STATUS.message(code).to_string(),
            status: Some(code),
        });
    }

    Ok(status)
}

/// Attach the card/trace fields the gateway posts back alongside the
/// reference number.
pub(crate) fn with_callback_details(mut receipt: Receipt, callback: &CallbackParams) -> Receipt {
    for (detail, param) in [
        ("traceNo", "TraceNo"),
        ("referenceNo", "RRN"),
        ("transactionId", "RefNum"),
        ("cardNo", "SecurePan"),
    ] {
        if let Some(value) = callback.input(param) {
            receipt = receipt.with_detail(detail, value);
        }
    }
    receipt
}
