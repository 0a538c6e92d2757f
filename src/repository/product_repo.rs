// ==========================================
// 代发货库存管理后端 - 商品 Repository Trait
// ==========================================
// 职责: 定义商品数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::product::{
    PricingUpdate, Product, ProductFilter, ProductKey, ProductUpsert, UpsertOutcome,
};
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Utc};

// ==========================================
// ProductRepository Trait
// ==========================================
// 用途: 导入流程 upsert、导出流程查询、商品管理
// 实现者: ProductRepositoryImpl（使用 rusqlite）
pub trait ProductRepository: Send + Sync {
    /// 按唯一键查询
    fn find_by_key(&self, key: &ProductKey) -> RepositoryResult<Option<Product>>;

    /// 按 ID 查询
    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>>;

    /// 按唯一键 upsert
    ///
    /// # 参数
    /// - upsert: 写入内容（含唯一键）
    /// - now: 写入时间（created_at / updated_at）
    ///
    /// # 返回
    /// - Ok(Created(id)): 新建
    /// - Ok(Updated(id)): 覆盖已有商品的可变字段
    /// - Err: 约束违反 / 数据库错误（单行失败，不影响其他行）
    fn upsert(&self, upsert: &ProductUpsert, now: DateTime<Utc>) -> RepositoryResult<UpsertOutcome>;

    /// 新建单个商品（唯一键已存在时返回 UniqueConstraintViolation）
    fn insert(&self, upsert: &ProductUpsert, now: DateTime<Utc>) -> RepositoryResult<i64>;

    /// 按过滤条件查询（created_at DESC, id DESC）
    fn list(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>>;

    /// 按过滤条件计数（忽略 limit / offset）
    fn count(&self, filter: &ProductFilter) -> RepositoryResult<i64>;

    /// 软删除（is_active = 0）
    ///
    /// # 返回
    /// - Ok(true): 已停用
    /// - Ok(false): 商品不存在
    fn deactivate(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<bool>;

    /// 写入外部计价 / 抓取结果
    fn record_pricing(
        &self,
        id: i64,
        pricing: &PricingUpdate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;
}
