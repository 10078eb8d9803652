//! Extraction of issuance details from free-text staff replies.
//!
//! Staff confirm a ticket by replying with something like
//! `"Issued RES-887766 PNR: ABC123 TKT: 0019988"`. Replies are typed on
//! phones, in several scripts and with no fixed template, so extraction
//! only reports what it found plus whether it is *confident*; nothing here
//! touches storage.
//!
//! Rules:
//! - the text is NFKC-normalized and Arabic-Indic digits are folded to ASCII
//! - PNR: a labelled value (`PNR`, `record locator`, `locator`, optionally
//!   followed by `no.`, `number`, `code` or `is`) of 3-8 alphanumerics,
//!   else exactly one bare 6-char token mixing letters and digits
//! - ticket: a labelled value (`TKT`, `ticket`, `e-ticket`, `ETKT`) of 4-14
//!   digits with an optional `NNN-` airline prefix, else exactly one bare run
//!   of 10-14 digits
//! - booking ref: `RES-<digits>` in the text, else the claimed ref; a ref in
//!   the text that differs from the claimed one is not confident
//! - negative cues (cancel, reject, failed, unable, not issued, waitlist)
//!   are never confident

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub booking_ref: Option<String>,
    pub pnr: Option<String>,
    pub ticket_number: Option<String>,
    pub confident: bool,
    /// Why the extraction is not confident.
    pub reason: Option<String>,
}

impl Extraction {
    fn reject(mut self, reason: impl Into<String>) -> Self {
        self.confident = false;
        if self.reason.is_none() {
            self.reason = Some(reason.into());
        }
        self
    }
}

/// Compiled extraction rules. Built once by the engine builder.
#[derive(Clone, Debug)]
pub struct IssuanceParser {
    booking_ref: Regex,
    labelled_pnr: Regex,
    bare_pnr: Regex,
    labelled_ticket: Regex,
    bare_ticket: Regex,
    negative: Regex,
}

fn compile(pattern: &str) -> ResultEngine<Regex> {
    Regex::new(pattern)
        .map_err(|err| EngineError::InvalidAmount(format!("invalid extraction pattern: {err}")))
}

/// NFKC plus folding of Arabic-Indic and Extended Arabic-Indic digits,
/// which have no compatibility decomposition.
fn normalize(text: &str) -> String {
    text.nfkc()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            other => other,
        })
        .collect()
}

/// Words that can follow a PNR label without being the locator.
const NOT_A_PNR: [&str; 6] = ["NUMBER", "CODE", "TKT", "ETKT", "TICKET", "ETICKET"];

/// Distinct values in order of appearance.
fn distinct(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

impl IssuanceParser {
    pub fn new() -> ResultEngine<Self> {
        Ok(Self {
            booking_ref: compile(r"(?i)\bRES-([0-9]{1,12})\b")?,
            labelled_pnr: compile(
                r"(?i)\b(?:pnr|record\s+locator|locator)\b\s*(?:(?:no\b\.?|number\b|code\b|is\b)\s*)?(?:[:#=-]\s*)?([a-z0-9]{3,8})\b",
            )?,
            bare_pnr: compile(r"\b[A-Za-z0-9]{6}\b")?,
            labelled_ticket: compile(
                r"(?i)\b(?:e-?ticket|etkt|tkt|ticket)(?:\s*(?:no\.?|number|#))?\s*(?:[:#=-]\s*)?((?:[0-9]{3}-)?[0-9]{4,14})\b",
            )?,
            bare_ticket: compile(r"\b[0-9]{10,14}\b")?,
            negative: compile(
                r"(?i)\b(?:cancel(?:l?ed|lation)?|reject(?:ed)?|failed|unable|not\s+issued|wait\s*-?list(?:ed)?)\b",
            )?,
        })
    }

    /// Extracts booking ref, PNR and ticket number from `text`.
    ///
    /// `claimed_ref` is the booking the message is supposedly about (e.g.
    /// from the request), used when the text carries no `RES-` reference.
    pub fn extract(&self, text: &str, claimed_ref: Option<&str>) -> Extraction {
        let text = normalize(text);
        let claimed_ref = claimed_ref
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase);

        let mut out = Extraction {
            confident: true,
            ..Extraction::default()
        };

        // booking ref
        let refs = distinct(
            self.booking_ref
                .captures_iter(&text)
                .map(|c| format!("RES-{}", &c[1])),
        );
        match (refs.as_slice(), claimed_ref) {
            ([], None) => out = out.reject("no booking reference"),
            ([], Some(claimed)) => out.booking_ref = Some(claimed),
            ([found], None) => out.booking_ref = Some(found.clone()),
            ([found], Some(claimed)) => {
                out.booking_ref = Some(claimed.clone());
                if *found != claimed {
                    out = out.reject(format!(
                        "text mentions {found} but the reply is for {claimed}"
                    ));
                }
            }
            (_, claimed) => {
                out.booking_ref = claimed;
                out = out.reject("multiple booking references");
            }
        }

        // PNR
        let labelled = distinct(
            self.labelled_pnr
                .captures_iter(&text)
                .map(|c| c[1].to_ascii_uppercase())
                .filter(|pnr| !NOT_A_PNR.contains(&pnr.as_str())),
        );
        let pnrs = if labelled.is_empty() {
            distinct(
                self.bare_pnr
                    .find_iter(&text)
                    .map(|m| m.as_str())
                    .filter(|t| {
                        t.chars().any(|c| c.is_ascii_alphabetic())
                            && t.chars().any(|c| c.is_ascii_digit())
                    })
                    .map(str::to_ascii_uppercase),
            )
        } else {
            labelled
        };
        match pnrs.as_slice() {
            [] => out = out.reject("no PNR"),
            [pnr] => out.pnr = Some(pnr.clone()),
            _ => out = out.reject("ambiguous PNR"),
        }

        // ticket
        let labelled = distinct(
            self.labelled_ticket
                .captures_iter(&text)
                .map(|c| c[1].to_string()),
        );
        let tickets = if labelled.is_empty() {
            distinct(
                self.bare_ticket
                    .find_iter(&text)
                    .map(|m| m.as_str().to_string()),
            )
        } else {
            labelled
        };
        match tickets.as_slice() {
            [] => out = out.reject("no ticket number"),
            [ticket] => out.ticket_number = Some(ticket.clone()),
            _ => out = out.reject("ambiguous ticket number"),
        }

        if let Some(cue) = self.negative.find(&text) {
            out = out.reject(format!("negative cue: {:?}", cue.as_str()));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> IssuanceParser {
        IssuanceParser::new().unwrap()
    }

    #[test]
    fn extracts_labelled_values() {
        let cases = [
            (
                "Issued RES-887766 PNR: ABC123 TKT: 0019988",
                ("RES-887766", "ABC123", "0019988"),
            ),
            (
                "res-000042 record locator xy9k2q e-ticket 157-1234567890 done",
                ("RES-000042", "XY9K2Q", "157-1234567890"),
            ),
            (
                "RES-12 Locator=QWE ticket no. 12345",
                ("RES-12", "QWE", "12345"),
            ),
            (
                "RES-5 ETKT#2201234567 PNR ZZ12AB",
                ("RES-5", "ZZ12AB", "2201234567"),
            ),
            (
                "Issued RES-887766 PNR number ABC123 TKT 0019988",
                ("RES-887766", "ABC123", "0019988"),
            ),
            (
                "RES-887766 PNR code: ABC123 ticket 0019988",
                ("RES-887766", "ABC123", "0019988"),
            ),
            (
                "RES-887766 pnr no. XY9K2Q tkt 0019988",
                ("RES-887766", "XY9K2Q", "0019988"),
            ),
            (
                "RES-887766 PNR is ISX9K2 TKT 0019988",
                ("RES-887766", "ISX9K2", "0019988"),
            ),
        ];
        for (text, (booking_ref, pnr, ticket)) in cases {
            let ex = parser().extract(text, None);
            assert!(ex.confident, "{text}: {:?}", ex.reason);
            assert_eq!(ex.booking_ref.as_deref(), Some(booking_ref), "{text}");
            assert_eq!(ex.pnr.as_deref(), Some(pnr), "{text}");
            assert_eq!(ex.ticket_number.as_deref(), Some(ticket), "{text}");
        }
    }

    #[test]
    fn falls_back_to_bare_tokens() {
        let ex = parser().extract("done: K7M2QX 1572200112233", Some("RES-000101"));
        assert!(ex.confident, "{:?}", ex.reason);
        assert_eq!(ex.booking_ref.as_deref(), Some("RES-000101"));
        assert_eq!(ex.pnr.as_deref(), Some("K7M2QX"));
        assert_eq!(ex.ticket_number.as_deref(), Some("1572200112233"));
    }

    #[test]
    fn folds_arabic_and_fullwidth_digits() {
        // Arabic-Indic ticket digits and a full-width PNR
        let ex = parser().extract(
            "تم الإصدار RES-887766 PNR: ＡＢＣ１２３ TKT: ٠٠١٩٩٨٨",
            None,
        );
        assert!(ex.confident, "{:?}", ex.reason);
        assert_eq!(ex.pnr.as_deref(), Some("ABC123"));
        assert_eq!(ex.ticket_number.as_deref(), Some("0019988"));
    }

    #[test]
    fn not_confident_cases() {
        let cases = [
            ("RES-887766 PNR: ABC123", None, "no ticket number"),
            ("RES-887766 TKT: 0019988", None, "no PNR"),
            ("RES-887766 PNR number TKT 0019988", None, "no PNR"),
            ("RES-887766 PNR code, TKT: 0019988", None, "no PNR"),
            ("PNR: ABC123 TKT: 0019988", None, "no booking reference"),
            (
                "RES-887766 RES-887767 PNR: ABC123 TKT: 0019988",
                None,
                "multiple booking references",
            ),
            (
                "AB12CD XY34ZW 1234567890",
                Some("RES-1"),
                "ambiguous PNR",
            ),
            (
                "K7M2QX 1234567890 9876543210",
                Some("RES-1"),
                "ambiguous ticket number",
            ),
        ];
        for (text, claimed, reason) in cases {
            let ex = parser().extract(text, claimed);
            assert!(!ex.confident, "{text}");
            assert_eq!(ex.reason.as_deref(), Some(reason), "{text}");
        }
    }

    #[test]
    fn conflicting_claimed_ref_is_not_confident() {
        let ex = parser().extract("Issued RES-887766 PNR: ABC123 TKT: 0019988", Some("RES-111111"));
        assert!(!ex.confident);
        assert_eq!(ex.booking_ref.as_deref(), Some("RES-111111"));

        let same = parser().extract("Issued RES-887766 PNR: ABC123 TKT: 0019988", Some("res-887766"));
        assert!(same.confident);
    }

    #[test]
    fn negative_cues_block_confidence() {
        for text in [
            "RES-887766 PNR: ABC123 TKT: 0019988 cancelled by airline",
            "RES-887766 PNR: ABC123 TKT: 0019988 not issued yet",
            "RES-887766 PNR ABC123 waitlisted, TKT 0019988",
            "Unable to issue RES-887766 PNR: ABC123 TKT: 0019988",
            "RES-887766 PNR: ABC123 TKT: 0019988 payment failed",
        ] {
            let ex = parser().extract(text, None);
            assert!(!ex.confident, "{text}");
            assert!(ex.reason.unwrap().starts_with("negative cue"), "{text}");
        }
    }

    #[test]
    fn booking_ref_digits_are_not_a_pnr() {
        // 887766 has no letters, 0019988 is labelled
        let ex = parser().extract("RES-887766 TKT: 0019988", None);
        assert_eq!(ex.pnr, None);
    }
}
