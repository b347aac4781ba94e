use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Stack equal-length rows of token ids into a `[rows, columns]` int tensor
pub fn int_matrix<B: Backend>(rows: &[Vec<u32>], device: &B::Device) -> Tensor<B, 2, Int> {
    let num_rows = rows.len();
    let num_columns = rows.first().map(Vec::len).unwrap_or(0);

    let values: Vec<B::IntElem> = rows
        .iter()
        .flat_map(|row| row.iter().map(|&e| (e as i64).elem()))
        .collect();

    Tensor::from_data(
        Data::new(values, Shape::new([num_rows, num_columns])),
        device,
    )
}

/// Build a 1D int tensor from class indexes
pub fn int_vector<B: Backend>(indexes: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let values: Vec<B::IntElem> = indexes.iter().map(|&e| (e as i64).elem()).collect();

    Tensor::from_data(Data::new(values, Shape::new([indexes.len()])), device)
}
