/// Implements [Record](crate::model::Record) for a model, naming the backend collection it lives in
/// and the field that holds its id.
///
/// # Syntax
/// ```ignore
/// define_collection!("collection_name" : Model = id_field);
/// ```
///
/// # Example
///
/// ```ignore
/// define_collection!("posts" : Post = id);
///
/// let posts: Vec<Post> = backend::list(&backend, 1, 10, &query, &session).await?;
/// ```
#[macro_export]
macro_rules! define_collection {
    ($collection:literal : $model:ty = $id:ident) => {
        impl $crate::model::Record for $model {
            fn id(&self) -> &str {
                &self.$id
            }

            fn collection() -> &'static str {
                $collection
            }
        }
    };
}
