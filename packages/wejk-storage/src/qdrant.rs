use std::collections::HashMap;

use qdrant_client::qdrant::{
	PointId, Query, QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions, value::Kind,
};

use wejk_domain::documents::{self, Document};

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	pub vector_name: Option<String>,
}
impl QdrantStore {
	pub fn new(cfg: &wejk_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			vector_name: cfg.vector_name.clone(),
		})
	}

	/// Nearest-neighbour search over the page collection, best match first.
	pub async fn search(&self, vector: Vec<f32>, top_k: u32) -> Result<Vec<Document>> {
		if vector.len() != self.vector_dim as usize {
			return Err(crate::Error::InvalidArgument(format!(
				"Query vector has {} dimensions; collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut request = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(u64::from(top_k))
			.with_payload(true);

		if let Some(name) = self.vector_name.as_deref() {
			request = request.using(name);
		}

		let response = self.client.query(request).await?;

		Ok(response.result.into_iter().map(document_from_point).collect())
	}
}

pub fn document_from_point(point: ScoredPoint) -> Document {
	let payload = &point.payload;
	let title = payload_string(payload, "title");
	let url = payload_string(payload, "url");
	let id = point
		.id
		.and_then(point_id_string)
		.unwrap_or_else(|| documents::document_id(&url, &title));

	Document {
		id,
		score: point.score,
		text_content: payload_string(payload, "textContent"),
		category: payload_string(payload, "category"),
		date: payload_string(payload, "date"),
		title,
		url,
	}
}

fn point_id_string(id: PointId) -> Option<String> {
	match id.point_id_options? {
		PointIdOptions::Uuid(uuid) => Some(uuid),
		PointIdOptions::Num(num) => Some(num.to_string()),
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> String {
	match payload.get(key).and_then(|value| value.kind.as_ref()) {
		Some(Kind::StringValue(text)) => text.clone(),
		_ => String::new(),
	}
}
