use sqlx::{Pool, Postgres};

mod user;
pub use user::UserExt;

mod catalog;
pub use catalog::CatalogExt;

mod title;
pub use title::{TitleExt, TitleFilter, TitleRecord};

mod review;
pub use review::ReviewExt;

mod comment;
pub use comment::CommentExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
