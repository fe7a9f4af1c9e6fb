use api_types::{
    category::{Category, CategoryUpsert},
    criteria::Criteria,
    expense::{Expense, ExpenseUpsert},
    page::Page,
};
use uuid::Uuid;

use crate::ResultEngine;

/// A remotely owned record the client can list and edit.
pub trait Entity: Clone {
    /// Request body used to create or update the entity.
    type Upsert;

    /// Lower-case singular label, used in user-facing messages.
    const SINGULAR: &'static str;
    /// Lower-case plural label, used in user-facing messages.
    const PLURAL: &'static str;

    fn id(&self) -> Option<Uuid>;
}

impl Entity for Category {
    type Upsert = CategoryUpsert;

    const SINGULAR: &'static str = "category";
    const PLURAL: &'static str = "categories";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

impl Entity for Expense {
    type Upsert = ExpenseUpsert;

    const SINGULAR: &'static str = "expense";
    const PLURAL: &'static str = "expenses";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

/// One remote collection (`/categories`, `/expenses`).
///
/// Every call is a single attempt. Any failure is reported as
/// [`EngineError::RequestFailed`](crate::EngineError::RequestFailed).
#[allow(async_fn_in_trait)]
pub trait Resource {
    type Item: Entity;

    /// Paginated, sorted and filtered read.
    async fn fetch_page(&self, criteria: &Criteria) -> ResultEngine<Page<Self::Item>>;

    /// Unpaginated read, used to populate selection lists.
    async fn fetch_all(&self, criteria: &Criteria) -> ResultEngine<Vec<Self::Item>>;

    /// Creates or updates. The server may answer with the stored entity or
    /// with an empty body.
    async fn upsert(
        &self,
        body: &<Self::Item as Entity>::Upsert,
    ) -> ResultEngine<Option<Self::Item>>;

    async fn delete_by_id(&self, id: Uuid) -> ResultEngine<()>;
}

/// Walks every page of `criteria` (starting from its page index) and returns
/// the concatenated content.
pub async fn fetch_every_page<R: Resource>(
    resource: &R,
    criteria: &Criteria,
) -> ResultEngine<Vec<R::Item>> {
    let mut criteria = criteria.clone();
    let mut items = Vec::new();
    loop {
        let page = resource.fetch_page(&criteria).await?;
        items.extend(page.content);
        if page.last {
            return Ok(items);
        }
        criteria.page += 1;
    }
}
