pub mod delivery_receipt;
pub mod destination_kind;
pub mod guild;
pub mod job;
pub mod job_type;
pub mod subscription;
