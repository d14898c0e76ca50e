/// 可依名稱登錄到 `Manager` 的物件。
pub trait NamedObject {
    fn name(&self) -> &str;
}
