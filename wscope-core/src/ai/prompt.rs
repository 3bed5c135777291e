//! Prompt templates for the wallet analyst.

use wscope_sdk::objects::AiContext;

/// Serialized transfers are cut to this many characters.
pub const MAX_TRANSFERS_CHARS: usize = 6000;

const CHAT_SYSTEM: &str = "You are a helpful crypto wallet analyst. Only answer questions grounded \
in the provided data. If a question is unrelated or requires external data, reply that you can \
only answer based on the provided response.";

pub fn summary(context: &AiContext) -> String {
    format!(
        "You are an expert blockchain analyst. Summarize this wallet concisely for a dashboard.\n\
         Chain: {chain}\n\
         Address: {address}\n\
         Balance: {balance}\n\
         Recent Transfers (max 10): {transfers}\n\
         Provide:\n\
         - Current balance and rough USD equivalent (assume BTC $65000, ETH $3000, SOL $150, USDT $1)\n\
         - Activity overview (incoming vs outgoing, last activity time)\n\
         - Notable patterns or risks\n\
         - 2-3 actionable insights for the user",
        chain = context.chain,
        address = context.address,
        balance = balance(context),
        transfers = transfers_json(context),
    )
}

pub fn chat(context: &AiContext, question: &str) -> String {
    format!(
        "{CHAT_SYSTEM}\n\n\
         Wallet Context:\n\
         Chain: {chain}\n\
         Address: {address}\n\
         Balance: {balance}\n\
         Transfers: {transfers}\n\n\
         Question: {question}",
        chain = context.chain,
        address = context.address,
        balance = balance(context),
        transfers = transfers_json(context),
    )
}

fn balance(context: &AiContext) -> String {
    context
        .balance
        .map(|b| b.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn transfers_json(context: &AiContext) -> String {
    let json = serde_json::to_string(&context.transfers).unwrap_or_else(|_| "[]".to_string());
    truncate_chars(json, MAX_TRANSFERS_CHARS)
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max) {
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn context() -> AiContext {
        AiContext {
            chain: "btc".to_string(),
            address: "bc1qexample".to_string(),
            balance: Some(Decimal::new(15, 1)),
            transfers: vec![serde_json::json!({"transaction_id": "aa", "amount": 1.5})],
        }
    }

    #[test]
    fn test_summary_mentions_wallet() {
        let prompt = summary(&context());
        assert!(prompt.contains("Chain: btc"));
        assert!(prompt.contains("Address: bc1qexample"));
        assert!(prompt.contains("Balance: 1.5"));
        assert!(prompt.contains(r#""transaction_id":"aa""#));
        assert!(prompt.contains("actionable insights"));
    }

    #[test]
    fn test_chat_ends_with_question() {
        let prompt = chat(&context(), "Any large outflows?");
        assert!(prompt.starts_with("You are a helpful crypto wallet analyst."));
        assert!(prompt.contains("Wallet Context:"));
        assert!(prompt.ends_with("Question: Any large outflows?"));
    }

    #[test]
    fn test_missing_balance() {
        let mut ctx = context();
        ctx.balance = None;
        assert!(summary(&ctx).contains("Balance: unknown"));
    }

    #[test]
    fn test_transfers_are_truncated_on_char_boundary() {
        let mut ctx = context();
        ctx.transfers = vec![serde_json::Value::String("é".repeat(MAX_TRANSFERS_CHARS))];
        let json = transfers_json(&ctx);
        assert_eq!(json.chars().count(), MAX_TRANSFERS_CHARS);
        assert!(json.starts_with("[\"é"));
    }
}
