use sea_orm::DbErr;

#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    #[error("无法连接数据库: {0}")]
    Connection(#[source] DbErr),
    #[error("查询失败: {0}")]
    Query(#[from] DbErr),
    #[error("结果集不符合约定: {0}")]
    Contract(String),
    #[error("终端 I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}
