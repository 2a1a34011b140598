/// Signed feature hashing of lowercase alphanumeric tokens, L2-normalized.
///
/// Texts sharing words land close together, which is all retrieval tests need.
pub fn hash_embed(text: &str, dim: usize) -> Vec<f32> {
	let mut vector = vec![0.0_f32; dim.max(1)];
	let lowered = text.to_lowercase();

	for token in lowered.split(|ch: char| !ch.is_alphanumeric()).filter(|token| !token.is_empty()) {
		let hash = blake3::hash(token.as_bytes());
		let bytes = hash.as_bytes();
		let bucket = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize % vector.len();
		let sign = if bytes[4] & 1 == 0 { 1.0 } else { -1.0 };

		vector[bucket] += sign;
	}

	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in &mut vector {
			*value /= norm;
		}
	}

	vector
}

pub fn cosine(left: &[f32], right: &[f32]) -> f32 {
	let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
	let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
	let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

	if left_norm == 0.0 || right_norm == 0.0 {
		return 0.0;
	}

	dot / (left_norm * right_norm)
}
