mod fabric;

pub use fabric::{loader_label, FabricArguments, FabricLibrary, FabricMeta, FabricProfile};
