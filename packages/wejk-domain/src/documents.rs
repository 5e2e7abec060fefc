//! Evidence documents returned by the vector store and the rules for merging them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	pub id: String,
	pub score: f32,
	pub title: String,
	pub text_content: String,
	pub category: String,
	pub url: String,
	pub date: String,
}

/// Stable identity of an ingested page, so re-ingesting the same page overwrites its point.
///
/// The first 128 bits of the digest of `"{url}:{title}"`, rendered in the 8-4-4-4-12 layout.
pub fn document_id(url: &str, title: &str) -> String {
	let digest = blake3::hash(format!("{url}:{title}").as_bytes());
	let hex = digest.to_hex();
	let hex = hex.as_str();

	[&hex[0..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..32]].join("-")
}

/// Unions result batches into a set keyed by document identity.
///
/// When an identity appears more than once the copy from the later batch replaces the earlier
/// one, keeping the position where the identity was first seen. Batches are passed in query
/// issuance order, so the result does not depend on which search finished first.
pub fn merge_unique<I>(batches: I) -> Vec<Document>
where
	I: IntoIterator<Item = Vec<Document>>,
{
	let mut positions: HashMap<String, usize> = HashMap::new();
	let mut out: Vec<Document> = Vec::new();

	for doc in batches.into_iter().flatten() {
		match positions.get(&doc.id) {
			Some(&idx) => out[idx] = doc,
			None => {
				positions.insert(doc.id.clone(), out.len());
				out.push(doc);
			},
		}
	}

	out
}

/// Source URLs in first-seen order without repeats.
pub fn unique_urls(docs: &[Document]) -> Vec<String> {
	let mut seen = HashSet::new();

	docs.iter().filter(|doc| seen.insert(doc.url.as_str())).map(|doc| doc.url.clone()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(id: &str, score: f32) -> Document {
		Document {
			id: id.to_string(),
			score,
			title: format!("title {id}"),
			text_content: String::new(),
			category: "inne".to_string(),
			url: format!("https://example.test/{id}"),
			date: String::new(),
		}
	}

	#[test]
	fn document_id_is_stable_and_uuid_shaped() {
		let a = document_id("https://weeia.p.lodz.pl/", "WEEIA");
		let b = document_id("https://weeia.p.lodz.pl/", "WEEIA");
		let c = document_id("https://weeia.p.lodz.pl/", "Other");

		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(a.len(), 36);
		assert_eq!(a.matches('-').count(), 4);
	}

	#[test]
	fn merge_keeps_the_later_copy_of_an_identity() {
		let mut later = doc("a", 0.2);

		later.title = "later".to_string();

		let merged = merge_unique(vec![vec![doc("a", 0.9), doc("b", 0.5)], vec![later]]);

		assert_eq!(merged.len(), 2);
		assert_eq!(merged[0].id, "a");
		assert_eq!(merged[0].title, "later");
		assert_eq!(merged[0].score, 0.2);
		assert_eq!(merged[1].id, "b");
	}

	#[test]
	fn unique_urls_preserves_first_seen_order() {
		let mut dup = doc("c", 0.1);

		dup.url = "https://example.test/a".to_string();

		let urls = unique_urls(&[doc("a", 0.3), doc("b", 0.2), dup]);

		assert_eq!(urls, vec!["https://example.test/a", "https://example.test/b"]);
	}
}
