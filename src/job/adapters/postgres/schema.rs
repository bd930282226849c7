//! Diesel schema for job persistence.

diesel::table! {
    /// Shop jobs shown on the board.
    jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Unique shop job number.
        #[max_length = 50]
        job_number -> Varchar,
        /// Customer part number.
        #[max_length = 100]
        part_number -> Varchar,
        /// Optional title.
        title -> Nullable<Text>,
        /// Optional description.
        description -> Nullable<Text>,
        /// Optional shop notes.
        notes -> Nullable<Text>,
        /// Pieces ordered.
        total_pieces -> Int4,
        /// Pieces finished.
        pieces_completed -> Int4,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Free-form ETA.
        #[max_length = 50]
        eta_text -> Nullable<Varchar>,
        /// Optional priority.
        #[max_length = 10]
        priority -> Nullable<Varchar>,
        /// Optional shop area.
        #[max_length = 100]
        shop_area -> Nullable<Varchar>,
        /// Optional machine.
        #[max_length = 100]
        machine -> Nullable<Varchar>,
        /// Date the work arrived.
        date_received -> Date,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
