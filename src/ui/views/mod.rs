mod equipment_detail;
mod equipment_list;

pub use equipment_detail::EquipmentDetailView;
pub use equipment_list::EquipmentListView;
