/// DistilBERT for sequence classification
pub mod distilbert;
