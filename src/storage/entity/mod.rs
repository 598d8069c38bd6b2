pub mod daily_data;
pub mod yearly_data;
