//! Escrow lifecycle through the dispatcher: open a deal, pick a network,
//! confirm, and the rejections along the way.

mod common;

use rust_decimal_macros::dec;

use common::{GROUP, Harness, Sent, alice, answers, bob, carol, edits, messages_to};
use escrow_bot::texts;
use escrow_types::models::{Network, SERVICE_FEE, TransactionStatus};

fn transaction_count(h: &Harness) -> usize {
    h.db.with_conn(|conn| {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))?;
        Ok(n as usize)
    })
    .unwrap()
}

#[tokio::test]
async fn new_deal_records_amount_and_offers_networks() {
    let h = Harness::new();
    h.register(&bob()).await;

    let sent = h.group(&alice(), "/new @bob 100 Widget").await;

    let deals = h.db.deals_as_buyer(alice().id).unwrap();
    assert_eq!(deals.len(), 1);
    let deal = &deals[0];
    assert_eq!(deal.transaction.amount, dec!(100.00));
    assert_eq!(deal.transaction.fee_amount, SERVICE_FEE);
    assert_eq!(deal.transaction.total(), dec!(100.50));
    assert_eq!(deal.transaction.status, TransactionStatus::AwaitingPayment);
    assert_eq!(deal.transaction.chat_id, Some(GROUP));
    assert_eq!(deal.transaction.description, "Widget");
    assert!(!deal.transaction.fee_paid);
    assert_eq!(deal.seller.external_id, bob().id);

    let [Sent::Message { chat_id, reply }] = sent.as_slice() else {
        panic!("expected one reply, got {:?}", sent);
    };
    assert_eq!(*chat_id, GROUP);
    assert!(reply.text.contains("Base Amount: $100.00"));
    assert!(reply.text.contains("Total Amount: $100.50"));
    assert!(reply.text.contains("@alice and @bob"));

    let rows = &reply.keyboard.as_ref().unwrap().rows;
    let data: Vec<&str> = rows.iter().map(|r| r[0].data.as_str()).collect();
    let id = deal.transaction.id;
    assert_eq!(
        data,
        vec![
            format!("chain_BEP20_{}", id),
            format!("chain_ERC20_{}", id),
            format!("chain_OPTIMISM_{}", id),
            format!("chain_ARBITRUM_{}", id),
        ]
    );
}

#[tokio::test]
async fn description_keeps_every_word_and_is_escaped_on_display() {
    let h = Harness::new();
    h.register(&bob()).await;

    let sent = h.group(&alice(), "/new @Bob 12.5 Rare <b>card</b> & sleeve").await;

    let deal = &h.db.deals_as_buyer(alice().id).unwrap()[0];
    assert_eq!(deal.transaction.description, "Rare <b>card</b> & sleeve");
    assert_eq!(deal.transaction.amount, dec!(12.50));

    let text = &messages_to(&sent, GROUP)[0];
    assert!(text.contains("Rare &lt;b&gt;card&lt;/b&gt; &amp; sleeve"));
    assert!(text.contains("Total Amount: $13.00"));
}

#[tokio::test]
async fn too_few_arguments_create_nothing() {
    let h = Harness::new();
    h.register(&bob()).await;

    for text in ["/new", "/new @bob", "/new @bob 100"] {
        let sent = h.group(&alice(), text).await;
        assert_eq!(messages_to(&sent, GROUP), vec![texts::new_usage()]);
    }
    assert_eq!(transaction_count(&h), 0);
}

#[tokio::test]
async fn bad_amounts_create_nothing() {
    let h = Harness::new();
    h.register(&bob()).await;

    for amount in ["0", "-5", "abc", "0.001", "1000000000"] {
        let sent = h.group(&alice(), &format!("/new @bob {} Widget", amount)).await;
        assert_eq!(messages_to(&sent, GROUP), vec![texts::BAD_AMOUNT.to_string()]);
    }
    assert_eq!(transaction_count(&h), 0);
}

#[tokio::test]
async fn unknown_seller_is_not_created() {
    let h = Harness::new();

    let sent = h.group(&alice(), "/new @ghost 100 Widget").await;

    let text = &messages_to(&sent, GROUP)[0];
    assert!(text.contains("@ghost hasn't met me yet"));
    assert!(text.contains("(@EscrowBot)"));
    assert!(h.db.find_account_by_username("ghost").unwrap().is_none());
    assert_eq!(transaction_count(&h), 0);
    // The caller is registered as a side effect.
    assert!(h.db.get_account_by_external_id(alice().id).unwrap().is_some());
}

#[tokio::test]
async fn deals_need_a_group_and_two_parties() {
    let h = Harness::new();
    h.register(&bob()).await;
    h.register(&alice()).await;

    let sent = h.private(&alice(), "/new @bob 100 Widget").await;
    assert_eq!(messages_to(&sent, alice().id), vec![texts::NEW_NEEDS_GROUP.to_string()]);

    let sent = h.group(&alice(), "/new @alice 100 Widget").await;
    assert_eq!(messages_to(&sent, GROUP), vec![texts::SELF_DEAL.to_string()]);

    let long = "x".repeat(501);
    let sent = h.group(&alice(), &format!("/new @bob 100 {}", long)).await;
    assert_eq!(messages_to(&sent, GROUP), vec![texts::description_too_long()]);

    assert_eq!(transaction_count(&h), 0);
}

#[tokio::test]
async fn buyer_selects_network() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;

    let sent = h.press(&alice(), &format!("chain_ERC20_{}", id)).await;

    let deal = h.db.get_deal(id).unwrap().unwrap();
    assert_eq!(deal.transaction.network, Some(Network::Erc20));
    assert!(deal.transaction.network_selected_at.is_some());
    assert_eq!(deal.transaction.status, TransactionStatus::AwaitingPayment);

    let edited = edits(&sent);
    assert_eq!(edited.len(), 1);
    assert!(edited[0].contains("0x00cd23325e916ae47a93b50df1dbf420f50fbd70"));
    assert!(edited[0].contains("Amount to Send:</b> $100.50"));
    assert!(edited[0].contains(&format!("/ok {}", id)));

    assert_eq!(answers(&sent), vec![Some(texts::NETWORK_CHOSEN_TOAST.to_string())]);

    let group = messages_to(&sent, GROUP);
    assert_eq!(group.len(), 1);
    assert!(group[0].contains("New Deal Started"));
    assert!(group[0].contains("Network: ERC20"));
}

#[tokio::test]
async fn network_choice_is_answered_when_edit_fails() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;
    h.recorder.cut_off(GROUP);

    let sent = h.press(&alice(), &format!("chain_BEP20_{}", id)).await;

    assert_eq!(answers(&sent), vec![Some(texts::NETWORK_CHOSEN_TOAST.to_string())]);
    assert!(edits(&sent).is_empty());
    assert_eq!(
        h.db.get_deal(id).unwrap().unwrap().transaction.network,
        Some(Network::Bep20)
    );
}

#[tokio::test]
async fn only_the_buyer_selects_network() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;

    for intruder in [carol(), bob()] {
        let sent = h.press(&intruder, &format!("chain_ERC20_{}", id)).await;
        assert_eq!(answers(&sent), vec![Some(texts::ONLY_BUYER_NETWORK.to_string())]);
        assert!(edits(&sent).is_empty());
    }
    assert_eq!(h.db.get_deal(id).unwrap().unwrap().transaction.network, None);

    h.press(&alice(), &format!("chain_BEP20_{}", id)).await;
    h.press(&carol(), &format!("chain_ERC20_{}", id)).await;
    assert_eq!(
        h.db.get_deal(id).unwrap().unwrap().transaction.network,
        Some(Network::Bep20)
    );
}

#[tokio::test]
async fn network_selection_rejects_bad_payloads() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;

    let sent = h.press(&alice(), "chain_ERC20_999").await;
    assert_eq!(answers(&sent), vec![Some(texts::DEAL_MISSING_TOAST.to_string())]);

    let sent = h.press(&alice(), &format!("chain_TRON_{}", id)).await;
    assert_eq!(answers(&sent), vec![Some(texts::NETWORK_UNKNOWN_TOAST.to_string())]);

    let sent = h.press(&alice(), "chain_ERC20").await;
    assert_eq!(answers(&sent), vec![Some(texts::CALLBACK_RETRY.to_string())]);

    assert_eq!(h.db.get_deal(id).unwrap().unwrap().transaction.network, None);
}

#[tokio::test]
async fn buyer_confirms_and_deal_completes() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;
    h.press(&alice(), &format!("chain_ARBITRUM_{}", id)).await;

    let sent = h.group(&alice(), &format!("/ok {}", id)).await;

    let deal = h.db.get_deal(id).unwrap().unwrap();
    assert_eq!(deal.transaction.status, TransactionStatus::Completed);
    assert!(deal.transaction.fee_paid);
    assert!(deal.transaction.completed_at.is_some());

    let group = messages_to(&sent, GROUP);
    assert_eq!(group.len(), 2);
    assert!(group[0].contains(&format!("Deal #{} Complete!", id)));
    assert!(group[0].contains("$100.50"));
    assert_eq!(group[1], texts::DEAL_COMPLETED);

    // Confirming again is harmless.
    let sent = h.group(&alice(), &format!("/ok {}", id)).await;
    assert_eq!(messages_to(&sent, GROUP).last().unwrap(), texts::DEAL_COMPLETED);
    let again = h.db.get_deal(id).unwrap().unwrap();
    assert_eq!(again.transaction.status, TransactionStatus::Completed);
    assert!(again.transaction.fee_paid);
}

#[tokio::test]
async fn only_the_buyer_confirms() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;

    let sent = h.group(&bob(), &format!("/ok {}", id)).await;
    assert_eq!(messages_to(&sent, GROUP), vec![texts::ONLY_BUYER_CONFIRM.to_string()]);

    let deal = h.db.get_deal(id).unwrap().unwrap();
    assert_eq!(deal.transaction.status, TransactionStatus::AwaitingPayment);
    assert!(deal.transaction.completed_at.is_none());
    assert!(!deal.transaction.fee_paid);
}

#[tokio::test]
async fn confirm_reports_bad_ids() {
    let h = Harness::new();

    let sent = h.group(&alice(), "/ok").await;
    assert_eq!(messages_to(&sent, GROUP), vec![texts::OK_USAGE.to_string()]);

    let sent = h.group(&alice(), "/ok twelve").await;
    assert_eq!(messages_to(&sent, GROUP), vec![texts::OK_USAGE.to_string()]);

    let sent = h.group(&alice(), "/ok 42").await;
    assert_eq!(messages_to(&sent, GROUP), vec![texts::DEAL_NOT_FOUND.to_string()]);
}

#[tokio::test]
async fn failed_group_notice_keeps_completion() {
    let h = Harness::new();
    let id = h.open_deal(&alice(), &bob(), "100").await;
    h.recorder.cut_off(GROUP);

    let sent = h.private(&alice(), &format!("/ok {}", id)).await;

    assert_eq!(messages_to(&sent, alice().id), vec![texts::DEAL_COMPLETED.to_string()]);
    let deal = h.db.get_deal(id).unwrap().unwrap();
    assert_eq!(deal.transaction.status, TransactionStatus::Completed);
}
