mod common;
mod test_listenable;
mod test_multiplex;
mod test_transform;
