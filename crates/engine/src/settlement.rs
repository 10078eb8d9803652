//! Pure settlement math: the quote and the journal lines it posts.
//!
//! Everything here is deterministic and storage-free; the transactional
//! side lives in `ops::settlement`.

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, FinancialSnapshot, JournalLine, Pricing, ResultEngine,
    accounts::{codes, sub_account_code},
};

/// Who pays for the booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payer", rename_all = "snake_case")]
pub enum Payer {
    /// Card or bank transfer into the cash/gateway account.
    Direct,
    /// Debited from the agent's wallet sub-account.
    Agent { agent_id: String },
}

/// Computes the frozen amounts for `passengers` seats at `pricing`.
///
/// Commission is only paid to agents. Net profit may be negative.
pub fn quote(pricing: &Pricing, passengers: i32, agent: bool) -> ResultEngine<FinancialSnapshot> {
    if passengers <= 0 {
        return Err(EngineError::InvalidAmount(
            "booking must have at least one passenger".to_string(),
        ));
    }
    pricing.validate()?;
    let overflow = || EngineError::InvalidAmount("quote overflow".to_string());
    let qty = i64::from(passengers);

    let total_minor = pricing.selling_minor.checked_mul(qty).ok_or_else(overflow)?;
    let cost_minor = pricing.cost_minor.checked_mul(qty).ok_or_else(overflow)?;
    let commission_minor = if agent {
        pricing
            .agent_commission_minor
            .checked_mul(qty)
            .ok_or_else(overflow)?
    } else {
        0
    };
    let net_profit_minor = total_minor
        .checked_sub(cost_minor)
        .and_then(|v| v.checked_sub(commission_minor))
        .ok_or_else(overflow)?;

    Ok(FinancialSnapshot {
        total_minor,
        cost_minor,
        commission_minor,
        net_profit_minor,
    })
}

/// Builds the settlement entry lines for a frozen snapshot.
///
/// Zero-amount pairs are left out, so a free booking has no lines at all.
/// The profit pair (4900/4300) keeps the entry balanced while crediting
/// system profit; a loss swaps its sides.
pub fn settlement_lines(
    snapshot: &FinancialSnapshot,
    payer: &Payer,
    airline_id: &str,
) -> Vec<JournalLine> {
    let mut lines = Vec::with_capacity(8);

    let paying_account = match payer {
        Payer::Direct => codes::CASH.to_string(),
        Payer::Agent { agent_id } => sub_account_code(codes::AGENTS, agent_id),
    };

    if snapshot.total_minor > 0 {
        lines.push(JournalLine::debit(paying_account, snapshot.total_minor));
        lines.push(JournalLine::credit(codes::SALES, snapshot.total_minor));
    }
    if snapshot.cost_minor > 0 {
        lines.push(JournalLine::debit(codes::COST_OF_SALES, snapshot.cost_minor));
        lines.push(JournalLine::credit(
            sub_account_code(codes::SUPPLIERS, airline_id),
            snapshot.cost_minor,
        ));
    }
    if let Payer::Agent { agent_id } = payer
        && snapshot.commission_minor > 0
    {
        lines.push(JournalLine::debit(
            codes::AGENT_COMMISSION,
            snapshot.commission_minor,
        ));
        lines.push(JournalLine::credit(
            sub_account_code(codes::AGENTS, agent_id),
            snapshot.commission_minor,
        ));
    }

    let profit = snapshot.net_profit_minor;
    if profit > 0 {
        lines.push(JournalLine::debit(codes::PROFIT_CLEARING, profit));
        lines.push(JournalLine::credit(codes::SYSTEM_PROFIT, profit));
    } else if profit < 0 {
        lines.push(JournalLine::debit(codes::SYSTEM_PROFIT, -profit));
        lines.push(JournalLine::credit(codes::PROFIT_CLEARING, -profit));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sums(lines: &[JournalLine]) -> (i64, i64) {
        (
            lines.iter().map(|l| l.debit_minor).sum(),
            lines.iter().map(|l| l.credit_minor).sum(),
        )
    }

    #[test]
    fn direct_customer_scenario() {
        let snap = quote(&Pricing::new(35_000, 20_000, 2_500), 1, false).unwrap();
        assert_eq!(snap.commission_minor, 0);
        assert_eq!(snap.net_profit_minor, 15_000);

        let lines = settlement_lines(&snap, &Payer::Direct, "ms");
        assert_eq!(lines.len(), 6);
        assert_eq!(sums(&lines), (70_000, 70_000));
        assert_eq!(lines[0], JournalLine::debit("1102", 35_000));
        assert_eq!(lines[3], JournalLine::credit("2100-ms", 20_000));
        assert_eq!(lines[5], JournalLine::credit("4300", 15_000));
    }

    #[test]
    fn agent_scenario_keeps_wallet_lines_apart() {
        let snap = quote(&Pricing::new(35_000, 20_000, 2_500), 1, true).unwrap();
        assert_eq!(snap.net_profit_minor, 12_500);

        let payer = Payer::Agent {
            agent_id: "a1".to_string(),
        };
        let lines = settlement_lines(&snap, &payer, "ms");
        assert_eq!(lines.len(), 8);
        let (debit, credit) = sums(&lines);
        assert_eq!(debit, credit);

        let wallet: Vec<_> = lines.iter().filter(|l| l.account_code == "2200-a1").collect();
        assert_eq!(wallet.len(), 2);
        let net: i64 = wallet.iter().map(|l| l.credit_minor - l.debit_minor).sum();
        assert_eq!(net, -32_500);
    }

    #[test]
    fn quote_multiplies_by_passengers() {
        let snap = quote(&Pricing::new(10_000, 7_000, 500), 3, true).unwrap();
        assert_eq!(snap.total_minor, 30_000);
        assert_eq!(snap.cost_minor, 21_000);
        assert_eq!(snap.commission_minor, 1_500);
        assert_eq!(snap.net_profit_minor, 7_500);
    }

    #[test]
    fn loss_swaps_profit_lines() {
        let snap = quote(&Pricing::new(10_000, 11_000, 0), 1, false).unwrap();
        let lines = settlement_lines(&snap, &Payer::Direct, "x");
        assert_eq!(lines[4], JournalLine::debit("4300", 1_000));
        assert_eq!(lines[5], JournalLine::credit("4900", 1_000));
        let (debit, credit) = sums(&lines);
        assert_eq!(debit, credit);
    }

    #[test]
    fn break_even_omits_profit_lines() {
        let snap = quote(&Pricing::new(10_000, 10_000, 0), 1, false).unwrap();
        let lines = settlement_lines(&snap, &Payer::Direct, "x");
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.account_code != "4300"));
    }

    #[test]
    fn quote_rejects_empty_or_negative() {
        assert!(quote(&Pricing::new(1, 1, 0), 0, false).is_err());
        assert!(quote(&Pricing::new(-1, 1, 0), 1, false).is_err());
        assert!(quote(&Pricing::new(i64::MAX, 0, 0), 2, false).is_err());
    }
}
