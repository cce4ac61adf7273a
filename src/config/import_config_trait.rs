// ==========================================
// 独立音乐人收入看板 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入 / 聚合所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    /// 历史视图中额外按列名识别为数值的表头
    ///
    /// # 默认值
    /// - 空列表（只识别 Net / Gross / Amount / Quantity 与模板数值角色）
    fn get_extra_numeric_columns(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 上传文件大小上限（字节）
    ///
    /// # 返回
    /// - Some(u64): config_kv 中的覆盖值
    /// - None: 未配置，使用进程启动参数
    fn get_max_upload_bytes(&self) -> Result<Option<u64>, Box<dyn Error>>;

    /// 导入请求未指定时是否提取资产收入
    ///
    /// # 默认值
    /// - true
    fn get_extract_assets_default(&self) -> Result<bool, Box<dyn Error>>;
}
