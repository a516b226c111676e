/*
 * Pair generation: every unordered token pair, in both directions
 */

use crate::models::{Permutation, TokenTable};

/// Produces the N·(N−1) directional permutations of a token table.
///
/// Pairs are taken in table order (`i < j`), and each pair is immediately
/// followed by its reverse, so the output is stable for a given table.
#[must_use]
pub fn permutations(tokens: &TokenTable) -> Vec<Permutation> {
    let tokens: Vec<_> = tokens.iter().collect();
    let mut out = Vec::with_capacity(tokens.len() * tokens.len().saturating_sub(1));

    for (i, from) in tokens.iter().enumerate() {
        for to in &tokens[i + 1..] {
            let forward = Permutation {
                from: (*from).clone(),
                to: (*to).clone(),
            };
            let reverse = forward.reversed();
            out.push(forward);
            out.push(reverse);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Token;
    use std::collections::HashSet;

    fn table(symbols: &[&str]) -> TokenTable {
        TokenTable::new(
            symbols
                .iter()
                .map(|s| Token {
                    symbol: (*s).to_string(),
                    mint: format!("{s}-mint"),
                })
                .collect(),
        )
        .unwrap()
    }

    fn symbols(perms: &[Permutation]) -> Vec<(String, String)> {
        perms
            .iter()
            .map(|p| (p.from.symbol.clone(), p.to.symbol.clone()))
            .collect()
    }

    #[test]
    fn three_tokens_yield_six_permutations() {
        let perms = permutations(&table(&["A", "B", "C"]));
        let got: HashSet<_> = symbols(&perms).into_iter().collect();
        let expected: HashSet<_> = [
            ("A", "B"),
            ("B", "A"),
            ("A", "C"),
            ("C", "A"),
            ("B", "C"),
            ("C", "B"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        assert_eq!(perms.len(), 6);
        assert_eq!(got, expected);
    }

    #[test]
    fn count_is_n_times_n_minus_one_without_duplicates() {
        for n in 2..=7 {
            let names: Vec<String> = (0..n).map(|i| format!("T{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let perms = permutations(&table(&refs));

            assert_eq!(perms.len(), n * (n - 1));
            assert!(perms.iter().all(|p| p.from != p.to));

            let unique: HashSet<_> = symbols(&perms).into_iter().collect();
            assert_eq!(unique.len(), perms.len());
            for (a, b) in &unique {
                assert!(unique.contains(&(b.clone(), a.clone())));
            }
        }
    }

    #[test]
    fn order_is_stable_and_pairs_are_adjacent() {
        let t = table(&["USDC", "SOL", "NANA"]);
        let first = symbols(&permutations(&t));
        let second = symbols(&permutations(&t));
        assert_eq!(first, second);
        assert_eq!(first[0], ("USDC".to_string(), "SOL".to_string()));
        assert_eq!(first[1], ("SOL".to_string(), "USDC".to_string()));
    }

    #[test]
    fn fewer_than_two_tokens_yield_nothing() {
        assert!(permutations(&table(&[])).is_empty());
        assert!(permutations(&table(&["A"])).is_empty());
    }
}
