use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

/// One-hot vector with a single `1.0` at `index`.
pub fn one_hot(index: usize, num_classes: usize) -> Vec<f32> {
    assert!(
        index < num_classes,
        "class index {index} out of range for {num_classes} classes"
    );
    let mut values = vec![0.0; num_classes];
    values[index] = 1.0;
    values
}

/// Linear interpolation between two one-hot vectors.
///
/// `ratio = 0.0` yields exactly `one_hot(first)`, `ratio = 1.0` exactly
/// `one_hot(second)`.
pub fn blend_condition(first: usize, second: usize, ratio: f32, num_classes: usize) -> Vec<f32> {
    let mut values = one_hot(first, num_classes);
    values[first] -= ratio;
    values[second] += ratio;
    values
}

/// Stack condition rows into a `[rows, num_classes]` tensor.
pub fn condition_tensor<B: Backend>(
    rows: &[Vec<f32>],
    num_classes: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut flat = Vec::with_capacity(rows.len() * num_classes);
    for row in rows {
        assert_eq!(row.len(), num_classes, "condition row has wrong width");
        flat.extend_from_slice(row);
    }
    Tensor::from_data(TensorData::new(flat, [rows.len(), num_classes]), device)
}

/// One-hot conditions for the given class indices.
pub fn one_hot_batch<B: Backend>(
    indices: &[usize],
    num_classes: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let rows: Vec<Vec<f32>> = indices
        .iter()
        .map(|&index| one_hot(index, num_classes))
        .collect();
    condition_tensor(&rows, num_classes, device)
}
