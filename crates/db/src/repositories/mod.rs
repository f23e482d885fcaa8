mod booking_repo;
mod room_repo;

pub use booking_repo::BookingRepo;
pub use room_repo::RoomRepo;
