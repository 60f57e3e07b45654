//! # KHQR Payload Generation
//!
//! Builds the EMV-compatible TLV string a banking app scans, plus the
//! MD5 reference the gateway settles under.
//!
//! ## TLV Encoding
//! ```text
//! ┌────┬────┬──────────────┐
//! │ ID │ LL │    value     │   ID: two digits, LL: value length,
//! └────┴────┴──────────────┘   zero-padded to two digits
//!
//! "00" + "02" + "01"          → payload format indicator
//! "29" + .. + nested TLVs     → merchant account (Bakong account id)
//! "63" + "04" + CRC16         → checksum, always last
//! ```
//!
//! The CRC is CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF) computed
//! over the payload including the trailing `6304`, rendered as four
//! uppercase hex digits.

use md5::{Digest, Md5};
use serde::Serialize;

use crate::error::{GatewayError, GatewayResult};

// =============================================================================
// Field IDs and Limits
// =============================================================================

const ID_PAYLOAD_FORMAT: &str = "00";
const ID_POINT_OF_INITIATION: &str = "01";
const ID_MERCHANT_ACCOUNT: &str = "29";
const ID_MERCHANT_CATEGORY: &str = "52";
const ID_CURRENCY: &str = "53";
const ID_AMOUNT: &str = "54";
const ID_COUNTRY: &str = "58";
const ID_MERCHANT_NAME: &str = "59";
const ID_MERCHANT_CITY: &str = "60";
const ID_ADDITIONAL_DATA: &str = "62";
const ID_CRC: &str = "63";

const SUB_ID_BAKONG_ACCOUNT: &str = "00";
const SUB_ID_BILL_NUMBER: &str = "01";
const SUB_ID_STORE_LABEL: &str = "03";
const SUB_ID_TERMINAL_LABEL: &str = "07";

/// "12" marks a dynamic QR: amount embedded, single use.
const POINT_OF_INITIATION_DYNAMIC: &str = "12";

/// General merchant category (EMV "5999": miscellaneous retail).
const MERCHANT_CATEGORY_RETAIL: &str = "5999";

const COUNTRY_CODE: &str = "KH";

const MAX_MERCHANT_NAME: usize = 25;
const MAX_MERCHANT_CITY: usize = 15;
const MAX_BILL_NUMBER: usize = 25;
const MAX_TLV_VALUE: usize = 99;

// =============================================================================
// Types
// =============================================================================

/// Settlement currency of the QR, carrying its ISO 4217 numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    /// Cambodian riel (no minor unit; amounts are whole riel).
    Khr,
    /// US dollar (amounts carry two decimal places).
    Usd,
}

impl Currency {
    /// ISO 4217 numeric code as it appears in field 53.
    pub fn numeric_code(&self) -> &'static str {
        match self {
            Currency::Khr => "116",
            Currency::Usd => "840",
        }
    }

    /// Parses "KHR" / "USD" (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "KHR" => Some(Currency::Khr),
            "USD" => Some(Currency::Usd),
            _ => None,
        }
    }

    /// Renders an amount in minor units for field 54.
    ///
    /// USD minor units are cents ("2750" → "27.50"); the riel has no
    /// minor unit, so KHR amounts pass through as whole riel.
    fn format_amount(&self, minor_units: i64) -> String {
        match self {
            Currency::Usd => format!("{}.{:02}", minor_units / 100, minor_units % 100),
            Currency::Khr => minor_units.to_string(),
        }
    }
}

/// The merchant identity embedded in every QR this terminal issues.
#[derive(Debug, Clone)]
pub struct MerchantInfo {
    /// Bakong account id, e.g. `shop@bank`.
    pub account_id: String,
    pub merchant_name: String,
    pub merchant_city: String,
    pub store_label: String,
    pub terminal_label: String,
    pub currency: Currency,
}

/// A generated QR: the scannable payload and its MD5, which is the
/// transaction reference for verification.
#[derive(Debug, Clone, Serialize)]
pub struct QrPayload {
    pub qr: String,
    pub md5: String,
}

// =============================================================================
// Generation
// =============================================================================

/// Builds the KHQR payload for one checkout amount.
///
/// `bill_number` (EMV field 62-01) must be unique per checkout. The
/// merchant identity and amount alone repeat across purchases; the bill
/// number is what makes the payload, and therefore its MD5 reference,
/// distinct for every QR this terminal mints.
///
/// Merchant name and city are truncated to their EMV limits rather than
/// rejected; the account id, labels, and bill number must fit their
/// fields.
pub fn generate(
    merchant: &MerchantInfo,
    amount_minor_units: i64,
    bill_number: &str,
) -> GatewayResult<QrPayload> {
    if amount_minor_units <= 0 {
        return Err(GatewayError::InvalidField(format!(
            "amount must be positive, got {amount_minor_units}"
        )));
    }
    if bill_number.is_empty() || bill_number.len() > MAX_BILL_NUMBER {
        return Err(GatewayError::InvalidField(format!(
            "bill number must be 1-{MAX_BILL_NUMBER} characters"
        )));
    }

    let account = tlv(SUB_ID_BAKONG_ACCOUNT, &merchant.account_id)?;
    let additional = format!(
        "{}{}{}",
        tlv(SUB_ID_BILL_NUMBER, bill_number)?,
        tlv(SUB_ID_STORE_LABEL, &merchant.store_label)?,
        tlv(SUB_ID_TERMINAL_LABEL, &merchant.terminal_label)?,
    );

    let mut payload = String::new();
    payload.push_str(&tlv(ID_PAYLOAD_FORMAT, "01")?);
    payload.push_str(&tlv(ID_POINT_OF_INITIATION, POINT_OF_INITIATION_DYNAMIC)?);
    payload.push_str(&tlv(ID_MERCHANT_ACCOUNT, &account)?);
    payload.push_str(&tlv(ID_MERCHANT_CATEGORY, MERCHANT_CATEGORY_RETAIL)?);
    payload.push_str(&tlv(ID_CURRENCY, merchant.currency.numeric_code())?);
    payload.push_str(&tlv(
        ID_AMOUNT,
        &merchant.currency.format_amount(amount_minor_units),
    )?);
    payload.push_str(&tlv(ID_COUNTRY, COUNTRY_CODE)?);
    payload.push_str(&tlv(
        ID_MERCHANT_NAME,
        truncate(&merchant.merchant_name, MAX_MERCHANT_NAME),
    )?);
    payload.push_str(&tlv(
        ID_MERCHANT_CITY,
        truncate(&merchant.merchant_city, MAX_MERCHANT_CITY),
    )?);
    payload.push_str(&tlv(ID_ADDITIONAL_DATA, &additional)?);

    // CRC covers everything up to and including its own "6304" header.
    payload.push_str(ID_CRC);
    payload.push_str("04");
    let crc = crc16_ccitt_false(payload.as_bytes());
    payload.push_str(&format!("{crc:04X}"));

    let md5 = hex::encode(Md5::digest(payload.as_bytes()));

    Ok(QrPayload { qr: payload, md5 })
}

/// Encodes one TLV field: two-digit id, two-digit length, value.
fn tlv(id: &str, value: &str) -> GatewayResult<String> {
    if value.len() > MAX_TLV_VALUE {
        return Err(GatewayError::InvalidField(format!(
            "field {id} value exceeds {MAX_TLV_VALUE} bytes"
        )));
    }
    Ok(format!("{id}{:02}{value}", value.len()))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// CRC-16/CCITT-FALSE: polynomial 0x1021, initial value 0xFFFF, no
/// reflection, no final XOR.
fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn merchant() -> MerchantInfo {
        MerchantInfo {
            account_id: "shop@bank".to_string(),
            merchant_name: "Bayon Coffee".to_string(),
            merchant_city: "Phnom Penh".to_string(),
            store_label: "Bayon".to_string(),
            terminal_label: "POS-01".to_string(),
            currency: Currency::Usd,
        }
    }

    #[test]
    fn test_crc_check_vector() {
        // Standard CRC-16/CCITT-FALSE check value.
        assert_eq!(crc16_ccitt_false(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_tlv_encoding() {
        assert_eq!(tlv("00", "01").unwrap(), "000201");
        assert_eq!(tlv("59", "Bayon Coffee").unwrap(), "5912Bayon Coffee");
    }

    #[test]
    fn test_tlv_rejects_oversized_value() {
        let long = "x".repeat(100);
        assert!(tlv("62", &long).is_err());
    }

    #[test]
    fn test_payload_shape() {
        let qr = generate(&merchant(), 2750, "INV-0001").unwrap().qr;

        assert!(qr.starts_with("000201"), "payload format indicator first");
        assert!(qr.contains("010212"), "dynamic point of initiation");
        assert!(qr.contains("5303840"), "USD numeric currency code");
        assert!(qr.contains("540527.50"), "amount with two decimals");
        assert!(qr.contains("5802KH"), "country code");

        // CRC last: "6304" then four uppercase hex digits.
        let tail = &qr[qr.len() - 8..];
        assert!(tail.starts_with("6304"));
        assert!(tail[4..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_crc_verifies_over_payload() {
        let qr = generate(&merchant(), 1000, "INV-0001").unwrap().qr;
        let (body, crc_hex) = qr.split_at(qr.len() - 4);
        let expected = crc16_ccitt_false(body.as_bytes());
        assert_eq!(crc_hex, format!("{expected:04X}"));
    }

    #[test]
    fn test_khr_amount_is_whole_riel() {
        let mut m = merchant();
        m.currency = Currency::Khr;
        let qr = generate(&m, 11000, "INV-0001").unwrap().qr;
        assert!(qr.contains("5303116"), "KHR numeric currency code");
        assert!(qr.contains("540511000"), "whole riel, no decimals");
    }

    #[test]
    fn test_bill_number_embedded_in_additional_data() {
        let qr = generate(&merchant(), 2750, "INV-0042").unwrap().qr;
        // 62-01: bill number sub-field inside additional data.
        assert!(qr.contains("0108INV-0042"));
    }

    #[test]
    fn test_md5_is_deterministic_reference() {
        let a = generate(&merchant(), 2750, "INV-0001").unwrap();
        let b = generate(&merchant(), 2750, "INV-0001").unwrap();

        assert_eq!(a.md5, b.md5, "same payload, same reference");
        assert_eq!(a.md5.len(), 32);
        assert_eq!(a.md5, hex::encode(Md5::digest(a.qr.as_bytes())));
    }

    #[test]
    fn test_repeat_purchase_gets_fresh_reference() {
        // Same shopper, same merchant, same total: the bill number is
        // the only thing that varies, and it must be enough to give the
        // second checkout its own transaction reference.
        let first = generate(&merchant(), 2750, "INV-0001").unwrap();
        let second = generate(&merchant(), 2750, "INV-0002").unwrap();

        assert_ne!(first.md5, second.md5);
        assert_ne!(first.qr, second.qr);
    }

    #[test]
    fn test_merchant_name_truncated() {
        let mut m = merchant();
        m.merchant_name = "A Very Long Merchant Name That Exceeds The Limit".to_string();
        let qr = generate(&m, 100, "INV-0001").unwrap().qr;
        assert!(qr.contains("5925A Very Long Merchant Name"));
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert!(generate(&merchant(), 0, "INV-0001").is_err());
        assert!(generate(&merchant(), -5, "INV-0001").is_err());
    }

    #[test]
    fn test_bill_number_limits() {
        assert!(generate(&merchant(), 100, "").is_err());
        assert!(generate(&merchant(), 100, &"x".repeat(26)).is_err());
        assert!(generate(&merchant(), 100, &"x".repeat(25)).is_ok());
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("usd"), Some(Currency::Usd));
        assert_eq!(Currency::parse("KHR"), Some(Currency::Khr));
        assert_eq!(Currency::parse("EUR"), None);
    }
}
