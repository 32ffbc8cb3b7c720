pub(crate) mod transforms;
