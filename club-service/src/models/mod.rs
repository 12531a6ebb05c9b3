pub mod club;
pub mod invitation;
pub mod membership;
pub mod ride;

pub use club::{
    ChangeClubStatusRequest, Club, ClubResponse, ClubStatus, CreateClubRequest, UpdateClubRequest,
};
pub use invitation::{
    AcceptInvitationRequest, CreateInvitationRequest, Invitation, InvitationResponse,
    InvitationStatus,
};
pub use membership::{
    ChangeMembershipRoleRequest, ChangeMembershipStatusRequest, Membership, MembershipResponse,
    MembershipStatus, TransferOwnershipRequest,
};
pub use ride::{
    CancelRideRequest, CreateRideRequest, Participant, ParticipantRole, Ride, RideAudience,
    RideResponse, RideStatus,
};
