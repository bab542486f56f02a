// Message rendering for detected swaps.

use crate::models::{short_address, SwapContext, SwapRecord, TokenMetadata};

/// Scale a raw integer amount by `decimals`, trimming trailing zeros.
pub fn format_amount(raw: u128, decimals: Option<u8>) -> String {
    let Some(decimals) = decimals.filter(|d| *d > 0) else {
        return raw.to_string();
    };
    let Some(scale) = 10u128.checked_pow(u32::from(decimals)) else {
        return raw.to_string();
    };

    let whole = raw / scale;
    let fraction = raw % scale;
    if fraction == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Bought and sold totals of `mint` across `swaps`, in raw units.
pub fn token_totals(swaps: &[SwapRecord], mint: &str) -> (u128, u128) {
    swaps.iter().fold((0u128, 0u128), |(bought, sold), swap| {
        let bought = if swap.token_in.mint == mint {
            bought.saturating_add(swap.token_in.amount)
        } else {
            bought
        };
        let sold = if swap.token_out.mint == mint {
            sold.saturating_add(swap.token_out.amount)
        } else {
            sold
        };
        (bought, sold)
    })
}

fn metadata(context: &SwapContext, mint: &str) -> TokenMetadata {
    context
        .tokens
        .get(mint)
        .cloned()
        .unwrap_or_else(|| TokenMetadata::unknown(mint))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// HTML body for chat delivery.
pub fn render_swap_message(address: &str, swap: &SwapRecord, context: &SwapContext) -> String {
    let token_in = metadata(context, &swap.token_in.mint);
    let token_out = metadata(context, &swap.token_out.mint);
    let traded = metadata(context, swap.traded_mint());
    let (bought, sold) = token_totals(&context.swaps, &traded.address);

    let mut lines = vec![
        format!("<b>Swap</b> by <code>{}</code>", escape_html(address)),
        format!(
            "+{} {}",
            format_amount(swap.token_in.amount, token_in.decimals),
            escape_html(&token_in.label())
        ),
        format!(
            "-{} {}",
            format_amount(swap.token_out.amount, token_out.decimals),
            escape_html(&token_out.label())
        ),
        String::new(),
        format!(
            "<b>{}</b> history: {} swaps, bought {}, sold {}",
            escape_html(&traded.label()),
            context.swaps.len(),
            format_amount(bought, traded.decimals),
            format_amount(sold, traded.decimals)
        ),
    ];

    if let Some(name) = traded.name.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("{} <code>{}</code>", escape_html(name), traded.address));
    } else {
        lines.push(format!("<code>{}</code>", traded.address));
    }
    lines.push(format!("<a href=\"https://solscan.io/tx/{}\">tx</a>", swap.signature));

    lines.join("\n")
}

/// One-line plain text form for the log.
pub fn render_swap_summary(address: &str, swap: &SwapRecord, context: &SwapContext) -> String {
    let token_in = metadata(context, &swap.token_in.mint);
    let token_out = metadata(context, &swap.token_out.mint);

    format!(
        "swap by {}: +{} {} -{} {} ({} swaps of {}) {}",
        short_address(address),
        format_amount(swap.token_in.amount, token_in.decimals),
        token_in.label(),
        format_amount(swap.token_out.amount, token_out.decimals),
        token_out.label(),
        context.swaps.len(),
        metadata(context, swap.traded_mint()).label(),
        swap.signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenAmount;

    #[test]
    fn formats_with_decimals() {
        assert_eq!(format_amount(1_500_000, Some(6)), "1.5");
        assert_eq!(format_amount(2_000_000, Some(6)), "2");
        assert_eq!(format_amount(42, Some(6)), "0.000042");
        assert_eq!(format_amount(42, None), "42");
        assert_eq!(format_amount(42, Some(0)), "42");
    }

    #[test]
    fn formats_amounts_beyond_u64() {
        let raw = u128::from(u64::MAX) * 10;
        assert_eq!(format_amount(raw, Some(9)), "184467440737.09551615");
        assert_eq!(format_amount(7, Some(60)), "7");
    }

    #[test]
    fn totals_split_by_direction() {
        let swap = |token_in: &str, amount_in: u128, token_out: &str, amount_out: u128| SwapRecord {
            signature: format!("{}{}", token_in, amount_in),
            account: "S".to_string(),
            token_in: TokenAmount { mint: token_in.to_string(), amount: amount_in },
            token_out: TokenAmount { mint: token_out.to_string(), amount: amount_out },
            block_time: None,
        };
        let swaps = vec![swap("T", 100, "Q", 1), swap("T", 50, "Q", 2), swap("Q", 3, "T", 30)];
        assert_eq!(token_totals(&swaps, "T"), (150, 30));
    }
}
