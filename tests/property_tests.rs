//! Property-based tests for the session cart.
//!
//! The cart's stored form is attacker-adjacent (it round-trips through the
//! session store as JSON), so these check that totals, counts, and the
//! sanitizing load boundary hold up across a wide range of inputs.

use std::collections::BTreeMap;

use marketplace_api::cart::{CartEntry, SessionCart};
use marketplace_api::entities::ProductType;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

fn price_strategy() -> impl Strategy<Value = Decimal> {
    // 0.00 to 9999.99, always two decimal places
    (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn entry_strategy() -> impl Strategy<Value = (Decimal, u32, bool, bool)> {
    (price_strategy(), 1u32..50, any::<bool>(), any::<bool>())
}

/// A cart's worth of lines with unique product ids.
fn lines_strategy() -> impl Strategy<Value = BTreeMap<i64, (Decimal, u32, bool, bool)>> {
    prop::collection::btree_map(1i64..10_000, entry_strategy(), 0..12)
}

fn entry_for(id: i64, price: Decimal, quantity: u32, needs_shipping: bool, is_downloadable: bool) -> CartEntry {
    CartEntry {
        id,
        name: format!("Product {}", id),
        price,
        quantity,
        image: String::new(),
        product_type: if needs_shipping {
            ProductType::Merch
        } else {
            ProductType::Digital
        },
        needs_shipping,
        is_downloadable,
        slug: format!("product-{}", id),
    }
}

fn cart_from(lines: &BTreeMap<i64, (Decimal, u32, bool, bool)>) -> SessionCart {
    let mut cart = SessionCart::new();
    for (&id, &(price, quantity, needs_shipping, is_downloadable)) in lines {
        cart.add(entry_for(id, price, quantity, needs_shipping, is_downloadable));
    }
    cart
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn total_is_the_sum_of_line_totals(lines in lines_strategy()) {
        let cart = cart_from(&lines);
        let expected: Decimal = lines
            .values()
            .map(|&(price, quantity, _, _)| price * Decimal::from(quantity))
            .sum::<Decimal>()
            .round_dp(2);
        prop_assert_eq!(cart.total(), expected);
    }

    #[test]
    fn item_count_is_the_sum_of_quantities(lines in lines_strategy()) {
        let cart = cart_from(&lines);
        let expected: u32 = lines.values().map(|&(_, quantity, _, _)| quantity).sum();
        prop_assert_eq!(cart.item_count(), expected);
        prop_assert_eq!(cart.line_count(), lines.len());
    }

    #[test]
    fn physical_flag_follows_any_shipping_line(lines in lines_strategy()) {
        let cart = cart_from(&lines);
        let expected = lines.values().any(|&(_, _, needs_shipping, _)| needs_shipping);
        prop_assert_eq!(cart.has_physical_items(), expected);
    }

    #[test]
    fn stored_form_round_trips(lines in lines_strategy()) {
        let cart = cart_from(&lines);
        let json = cart.to_json().unwrap();
        prop_assert_eq!(SessionCart::from_stored_json(&json), cart);
    }

    #[test]
    fn repeated_adds_accumulate_quantity(
        id in 1i64..10_000,
        price in price_strategy(),
        first in 1u32..1_000,
        second in 1u32..1_000,
    ) {
        let mut cart = SessionCart::new();
        cart.add(entry_for(id, price, first, false, true));
        let quantity = cart.add(entry_for(id, price, second, false, true));
        prop_assert_eq!(quantity, first + second);
        prop_assert_eq!(cart.line_count(), 1);
    }
}

fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (1i64..10_000).prop_map(|n| n.to_string()),
        (-10_000i64..=0).prop_map(|n| n.to_string()),
        "[a-z]{1,8}",
    ]
}

fn value_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(json!({
            "id": 1, "name": "Poster", "price": "20.00", "quantity": 1,
            "product_type": "merch", "needs_shipping": true, "is_downloadable": false
        })),
        Just(json!("garbage")),
        Just(json!(42)),
        Just(json!({"id": 1, "name": "No price"})),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn load_keeps_exactly_the_well_formed_positive_keys(
        stored in prop::collection::hash_map(key_strategy(), value_strategy(), 0..10)
    ) {
        let raw = serde_json::to_string(&stored).unwrap();
        let cart = SessionCart::from_stored_json(&raw);

        let expected = stored
            .iter()
            .filter(|(key, value)| {
                key.parse::<i64>().map(|id| id > 0).unwrap_or(false) && value.get("price").is_some()
            })
            .count();
        prop_assert_eq!(cart.line_count(), expected);
        for key in stored.keys() {
            if let Ok(id) = key.parse::<i64>() {
                if id <= 0 {
                    prop_assert!(cart.get(id).is_none());
                }
            }
        }
    }

    #[test]
    fn load_never_panics_on_arbitrary_text(raw in ".{0,200}") {
        let _ = SessionCart::from_stored_json(&raw);
    }
}
